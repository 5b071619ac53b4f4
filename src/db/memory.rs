use crate::config::HistoryTable;
use crate::db::{Database, HistoryBackend};
use crate::migration::MigrationDescriptor;
use crate::migration_tracking::HistoryRecord;
use anyhow::{Result, anyhow, bail};
use std::collections::HashMap;

/// Transaction control calls seen by a [`MemoryDatabase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Clone, Default)]
struct State {
    statements: Vec<String>,
    history: HashMap<String, Vec<HistoryRecord>>,
}

/// In-process database backend.
///
/// Executed statements are journaled instead of run. A transaction snapshots
/// the journal and the history tables and restores them on rollback, which
/// is enough to observe the runner's atomicity guarantees without a server.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: State,
    snapshot: Option<State>,
    events: Vec<TxEvent>,
    fail_statements: Vec<String>,
    fail_records: Vec<String>,
}

fn table_key(table: &HistoryTable) -> String {
    format!("{}.{}", table.schema, table.name)
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `execute` whose SQL contains `needle` fail.
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_statements.push(needle.into());
        self
    }

    /// Make recording the migration with this filename fail.
    pub fn fail_record_of(mut self, filename: impl Into<String>) -> Self {
        self.fail_records.push(filename.into());
        self
    }

    /// Statements whose effects are currently visible (rolled back ones are gone)
    pub fn executed(&self) -> Vec<String> {
        self.state.statements.clone()
    }

    pub fn history(&self, table: &HistoryTable) -> Vec<HistoryRecord> {
        self.state
            .history
            .get(&table_key(table))
            .cloned()
            .unwrap_or_default()
    }

    pub fn events(&self) -> &[TxEvent] {
        &self.events
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn table(&self, table: &HistoryTable) -> Result<&Vec<HistoryRecord>> {
        self.state
            .history
            .get(&table_key(table))
            .ok_or_else(|| anyhow!("relation \"{}\" does not exist", table_key(table)))
    }
}

impl Database for MemoryDatabase {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        if let Some(needle) = self.fail_statements.iter().find(|n| sql.contains(n.as_str())) {
            bail!("statement failed (matched {:?})", needle);
        }
        self.state.statements.push(sql.to_string());
        Ok(())
    }

    async fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            bail!("a transaction is already in progress");
        }
        self.snapshot = Some(self.state.clone());
        self.events.push(TxEvent::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.snapshot.take().is_none() {
            bail!("there is no transaction in progress");
        }
        self.events.push(TxEvent::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.snapshot.take() {
            Some(snapshot) => self.state = snapshot,
            None => bail!("there is no transaction in progress"),
        }
        self.events.push(TxEvent::Rollback);
        Ok(())
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

impl HistoryBackend for MemoryDatabase {
    async fn ensure_history(&mut self, table: &HistoryTable) -> Result<()> {
        self.state.history.entry(table_key(table)).or_default();
        Ok(())
    }

    async fn latest_record(&mut self, table: &HistoryTable) -> Result<Option<HistoryRecord>> {
        Ok(self
            .table(table)?
            .iter()
            .max_by_key(|record| record.timestamp)
            .cloned())
    }

    async fn count_records(&mut self, table: &HistoryTable) -> Result<u64> {
        Ok(self.table(table)?.len() as u64)
    }

    async fn insert_record(
        &mut self,
        table: &HistoryTable,
        migration: &MigrationDescriptor,
    ) -> Result<()> {
        if self.fail_records.contains(&migration.filename) {
            bail!("insert into history failed for {}", migration.filename);
        }

        let key = table_key(table);
        let records = self
            .state
            .history
            .get_mut(&key)
            .ok_or_else(|| anyhow!("relation \"{}\" does not exist", key))?;

        records.push(HistoryRecord {
            applied_at: chrono::Utc::now(),
            name: migration.name.clone(),
            timestamp: migration.timestamp,
            filename: migration.filename.clone(),
        });
        Ok(())
    }
}
