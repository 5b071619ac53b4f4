//! Reconciliation and execution of migrations against one database.

pub mod apply;
pub mod reconcile;

pub use apply::{Applier, ApplyFailure, ApplyReport, RunOptions};
pub use reconcile::{PendingReport, pending};

use crate::config::Migrations;
use crate::db::HistoryBackend;
use crate::migration::{
    DirectorySource, FileCatalog, MigrationDescriptor, MigrationSource, Scaffolder,
    bootstrap_directory,
};
use crate::migration_tracking::HistoryStore;
use anyhow::Result;
use tracing::debug;

/// Ties the catalog, history and applier together over a single connection.
pub struct Migrator<D, S> {
    db: D,
    source: S,
    catalog: FileCatalog,
    store: HistoryStore,
    transactional: bool,
    initialized: bool,
}

impl<D: HistoryBackend> Migrator<D, DirectorySource> {
    /// Migrator running the unit files found in the configured directory
    pub fn from_directory(db: D, config: &Migrations) -> Self {
        Self::new(db, DirectorySource::new(&config.directory), config)
    }
}

impl<D, S> Migrator<D, S>
where
    D: HistoryBackend,
    S: MigrationSource<D> + Sync,
{
    pub fn new(db: D, source: S, config: &Migrations) -> Self {
        Self {
            db,
            source,
            catalog: FileCatalog::new(&config.directory),
            store: HistoryStore::new(config.history_table.clone()),
            transactional: config.transactional,
            initialized: false,
        }
    }

    pub fn database(&mut self) -> &mut D {
        &mut self.db
    }

    pub fn history(&self) -> &HistoryStore {
        &self.store
    }

    /// Bootstrap the migrations directory and the history table. Only the
    /// first call does any work.
    pub async fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        bootstrap_directory(self.catalog.directory())?;
        self.store.ensure(&mut self.db).await?;
        self.initialized = true;

        debug!(
            "Migrator initialized for {}",
            self.catalog.directory().display()
        );
        Ok(())
    }

    /// Pending migrations plus the applied count and the last applied record.
    /// Recomputed on every call.
    pub async fn pending(&mut self) -> Result<PendingReport> {
        self.init().await?;

        let last = self.store.latest(&mut self.db).await?;
        let catalog = self.catalog.list_descriptors()?;
        let history = self.store.count(&mut self.db).await;

        Ok(PendingReport {
            pending: pending(last.as_ref().map(|record| record.timestamp), catalog),
            history,
            last,
        })
    }

    /// Apply pending migrations subject to `options`.
    pub async fn up(&mut self, options: &RunOptions) -> Result<ApplyReport> {
        let report = self.pending().await?;

        Applier::new(&self.store, &self.source)
            .transactional(self.transactional)
            .apply(&mut self.db, report.pending, options)
            .await
    }

    /// Scaffold a new migration unit. Touches only the filesystem.
    pub async fn create(
        &self,
        name: Option<&str>,
        skip_payload: bool,
    ) -> Result<MigrationDescriptor> {
        Scaffolder::new(self.catalog.directory())
            .create(name, skip_payload)
            .await
    }

    /// Close the connection.
    pub async fn release(self) -> Result<()> {
        self.db.close().await
    }
}
