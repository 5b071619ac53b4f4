//! Executable migration units.
//!
//! A unit on disk is a small YAML manifest (`<timestamp>_<name>.yaml`) copied
//! from the directory template. It points at the SQL to run: inline `sql`, an
//! explicit `payload` file, or by default `sql/<timestamp>_<name>.sql`.
//! In-process migrations implement [`Migration`] directly.

use crate::db::Database;
use crate::migration::descriptor::MigrationDescriptor;
use anyhow::{Context, Result, anyhow};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Something that can be run against a connection as one migration body.
pub trait Migration<D: Database>: Send + Sync {
    fn run<'a>(&'a self, db: &'a mut D) -> BoxFuture<'a, Result<()>>;
}

/// Resolves a descriptor into the migration body to execute.
pub trait MigrationSource<D: Database> {
    fn load(&self, migration: &MigrationDescriptor) -> Result<Arc<dyn Migration<D>>>;
}

/// Contents of a unit file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UnitManifest {
    /// Inline SQL; takes precedence over `payload`
    pub sql: Option<String>,
    /// Payload path relative to the migrations directory
    pub payload: Option<PathBuf>,
}

impl UnitManifest {
    pub fn parse(contents: &str) -> Result<Self> {
        let has_content = contents.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_content {
            return Ok(Self::default());
        }

        let manifest: Option<UnitManifest> = serde_yaml::from_str(contents)?;
        Ok(manifest.unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SqlBody {
    Inline(String),
    File(PathBuf),
}

/// Runs a SQL batch, read from its payload file at execution time.
#[derive(Debug, Clone)]
pub struct SqlMigration {
    label: String,
    body: SqlBody,
}

impl SqlMigration {
    pub fn inline(label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: SqlBody::Inline(sql.into()),
        }
    }

    pub fn from_file(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            body: SqlBody::File(path.into()),
        }
    }

    /// Build the migration described by a unit manifest.
    pub fn from_manifest(
        manifest: UnitManifest,
        migration: &MigrationDescriptor,
        migrations_dir: &Path,
    ) -> Self {
        match (manifest.sql, manifest.payload) {
            (Some(sql), _) => Self::inline(&migration.filename, sql),
            (None, Some(payload)) => {
                Self::from_file(&migration.filename, migrations_dir.join(payload))
            }
            (None, None) => {
                Self::from_file(&migration.filename, migration.payload_path(migrations_dir))
            }
        }
    }

    fn load_sql(&self) -> Result<String> {
        match &self.body {
            SqlBody::Inline(sql) => Ok(sql.clone()),
            SqlBody::File(path) => std::fs::read_to_string(path).with_context(|| {
                format!(
                    "Failed to read SQL payload {} for migration {}",
                    path.display(),
                    self.label
                )
            }),
        }
    }
}

impl<D: Database> Migration<D> for SqlMigration {
    fn run<'a>(&'a self, db: &'a mut D) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = self.load_sql()?;
            debug!("Executing {} ({} bytes of SQL)", self.label, sql.len());
            db.execute(&sql)
                .await
                .with_context(|| format!("Migration {} failed", self.label))
        })
    }
}

type MigrationFn<D> = Box<dyn Fn(&mut D) -> BoxFuture<'_, Result<()>> + Send + Sync>;

/// A migration body written in Rust.
///
/// ```ignore
/// let migration = FnMigration::new(|db: &mut PgDatabase| {
///     Box::pin(async move { db.execute("CREATE TABLE example ();").await })
/// });
/// ```
pub struct FnMigration<D> {
    run: MigrationFn<D>,
}

impl<D: Database + 'static> FnMigration<D> {
    pub fn new(
        run: impl Fn(&mut D) -> BoxFuture<'_, Result<()>> + Send + Sync + 'static,
    ) -> Self {
        Self { run: Box::new(run) }
    }
}

impl<D: Database + 'static> Migration<D> for FnMigration<D> {
    fn run<'a>(&'a self, db: &'a mut D) -> BoxFuture<'a, Result<()>> {
        (self.run)(db)
    }
}

/// Loads units from the migrations directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    directory: PathBuf,
}

impl DirectorySource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl<D: Database> MigrationSource<D> for DirectorySource {
    fn load(&self, migration: &MigrationDescriptor) -> Result<Arc<dyn Migration<D>>> {
        let unit_path = migration.unit_path(&self.directory);
        let contents = std::fs::read_to_string(&unit_path)
            .with_context(|| format!("Failed to read migration unit {}", unit_path.display()))?;
        let manifest = UnitManifest::parse(&contents)
            .with_context(|| format!("Invalid migration unit {}", unit_path.display()))?;

        Ok(Arc::new(SqlMigration::from_manifest(
            manifest,
            migration,
            &self.directory,
        )))
    }
}

/// In-process migrations keyed by timestamp.
pub struct StaticSource<D: Database> {
    migrations: HashMap<u64, Arc<dyn Migration<D>>>,
}

impl<D: Database> Default for StaticSource<D> {
    fn default() -> Self {
        Self {
            migrations: HashMap::new(),
        }
    }
}

impl<D: Database> StaticSource<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, timestamp: u64, migration: impl Migration<D> + 'static) -> Self {
        self.migrations.insert(timestamp, Arc::new(migration));
        self
    }
}

impl<D: Database> MigrationSource<D> for StaticSource<D> {
    fn load(&self, migration: &MigrationDescriptor) -> Result<Arc<dyn Migration<D>>> {
        self.migrations
            .get(&migration.timestamp)
            .cloned()
            .ok_or_else(|| anyhow!("No migration registered for {}", migration.filename))
    }
}
