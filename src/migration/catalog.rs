use crate::migration::descriptor::{MigrationDescriptor, parse_unit_filename};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of the migrations directory.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    directory: PathBuf,
}

impl FileCatalog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// All migration units, sorted ascending by timestamp.
    ///
    /// A missing directory means no migrations yet. Entries that don't follow
    /// the `<timestamp>_<name>.yaml` convention are skipped.
    pub fn list_descriptors(&self) -> Result<Vec<MigrationDescriptor>> {
        discover_migrations(&self.directory)
    }
}

/// Find all migration units in a directory and return them sorted by timestamp
pub fn discover_migrations(migrations_dir: &Path) -> Result<Vec<MigrationDescriptor>> {
    let mut migrations = Vec::new();

    if !migrations_dir.exists() {
        debug!(
            "Migrations directory {} does not exist yet",
            migrations_dir.display()
        );
        return Ok(migrations);
    }

    let entries = std::fs::read_dir(migrations_dir).with_context(|| {
        format!(
            "Failed to read migrations directory {}",
            migrations_dir.display()
        )
    })?;

    for entry in entries {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }

        let Some(filename) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };

        match parse_unit_filename(&filename) {
            Some(descriptor) => migrations.push(descriptor),
            None => debug!("Skipping non-migration file {}", filename),
        }
    }

    // Sort by timestamp (chronological order)
    migrations.sort_by_key(|m| m.timestamp);

    Ok(migrations)
}
