use crate::constants::{SQL_SUBDIR, TEMPLATE_CONTENTS, TEMPLATE_FILENAME};
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn template_path(migrations_dir: &Path) -> PathBuf {
    migrations_dir.join(TEMPLATE_FILENAME)
}

/// Prepare a migrations directory: the directory itself, its `sql/`
/// subdirectory and the unit template.
///
/// Safe to call on every start. Existing directories are left alone and an
/// existing template is never overwritten.
pub fn bootstrap_directory(migrations_dir: &Path) -> Result<()> {
    for dir in [migrations_dir.to_path_buf(), migrations_dir.join(SQL_SUBDIR)] {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} already exists", dir.display());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", dir.display()));
            }
        }
    }

    let template = template_path(migrations_dir);
    if !template.exists() {
        debug!("Writing unit template {}", template.display());
        std::fs::write(&template, TEMPLATE_CONTENTS)
            .with_context(|| format!("Failed to write {}", template.display()))?;
    }

    Ok(())
}
