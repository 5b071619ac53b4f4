use crate::db::HistoryBackend;
use crate::migration::{MigrationDescriptor, MigrationSource};
use crate::migration_tracking::HistoryStore;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Per-run stop conditions. `None` and `Some(0)` both mean unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Apply at most this many migrations
    pub steps: Option<u64>,
    /// Do not apply migrations dated after this timestamp
    pub to: Option<u64>,
}

impl RunOptions {
    pub fn step_limit(&self) -> Option<u64> {
        self.steps.filter(|steps| *steps > 0)
    }

    pub fn target(&self) -> Option<u64> {
        self.to.filter(|to| *to > 0)
    }

    fn stops_before(&self, migration: &MigrationDescriptor, applied: usize) -> bool {
        if let Some(limit) = self.step_limit()
            && applied as u64 >= limit
        {
            debug!("Step limit {} reached", limit);
            return true;
        }

        if let Some(target) = self.target()
            && migration.timestamp > target
        {
            debug!(
                "{} is past target {}, stopping",
                migration.filename, target
            );
            return true;
        }

        false
    }
}

/// The migration that aborted a run
#[derive(Debug)]
pub struct ApplyFailure {
    pub migration: MigrationDescriptor,
    pub error: anyhow::Error,
}

/// Outcome of one `up` run.
#[derive(Debug)]
pub struct ApplyReport {
    /// Migrations processed successfully, in order, before any stop condition
    /// or failure
    pub applied: Vec<MigrationDescriptor>,
    pub failure: Option<ApplyFailure>,
    /// Whether the run was wrapped in a single transaction
    pub transactional: bool,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Which of `applied` are still in the database. A failed transactional
    /// run was rolled back, so nothing is.
    pub fn persisted(&self) -> &[MigrationDescriptor] {
        if self.transactional && self.failure.is_some() {
            &[]
        } else {
            &self.applied
        }
    }
}

/// Executes pending migrations in order and records each one in the history.
pub struct Applier<'a, S> {
    store: &'a HistoryStore,
    source: &'a S,
    transactional: bool,
}

impl<'a, S> Applier<'a, S> {
    pub fn new(store: &'a HistoryStore, source: &'a S) -> Self {
        Self {
            store,
            source,
            transactional: true,
        }
    }

    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Apply `pending` (ascending by timestamp) until it is exhausted, a stop
    /// condition triggers or a migration fails.
    ///
    /// A failing migration is reported in [`ApplyReport::failure`], not as an
    /// error. `Err` is reserved for transaction control failures.
    pub async fn apply<D>(
        &self,
        db: &mut D,
        pending: Vec<MigrationDescriptor>,
        options: &RunOptions,
    ) -> Result<ApplyReport>
    where
        D: HistoryBackend,
        S: MigrationSource<D> + Sync,
    {
        if self.transactional {
            db.begin().await?;
        }

        let mut applied = Vec::new();
        let mut failure = None;

        for migration in pending {
            if options.stops_before(&migration, applied.len()) {
                break;
            }

            info!("Applying {}", migration.filename);
            match self.apply_one(db, &migration).await {
                Ok(()) => applied.push(migration),
                Err(error) => {
                    failure = Some(ApplyFailure { migration, error });
                    break;
                }
            }
        }

        if self.transactional {
            match &failure {
                None => db.commit().await?,
                Some(failed) => {
                    warn!(
                        "{} failed, rolling back {} applied migration(s)",
                        failed.migration.filename,
                        applied.len()
                    );
                    db.rollback().await.with_context(|| {
                        format!(
                            "Failed to roll back after migration {} failed: {:#}",
                            failed.migration.filename, failed.error
                        )
                    })?;
                }
            }
        } else if let Some(failed) = &failure {
            warn!(
                "{} failed, {} earlier migration(s) of this run stay committed",
                failed.migration.filename,
                applied.len()
            );
        }

        Ok(ApplyReport {
            applied,
            failure,
            transactional: self.transactional,
        })
    }

    async fn apply_one<D>(&self, db: &mut D, migration: &MigrationDescriptor) -> Result<()>
    where
        D: HistoryBackend,
        S: MigrationSource<D> + Sync,
    {
        let body = self.source.load(migration)?;
        body.run(db).await?;
        self.store.record(db, migration).await
    }
}
