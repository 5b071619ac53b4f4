use crate::config::types::HistoryTable;
use crate::db::HistoryBackend;
use crate::migration::MigrationDescriptor;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Safely convert a migration timestamp from u64 to i64 for database storage
pub fn version_to_db(version: u64) -> Result<i64> {
    i64::try_from(version).with_context(|| {
        format!(
            "Migration timestamp {} is too large for database storage (exceeds i64::MAX)",
            version
        )
    })
}

/// Safely convert a migration timestamp from i64 database storage to u64
/// Handles negative values (which shouldn't exist) gracefully
pub fn version_from_db(version: i64) -> u64 {
    if version < 0 {
        tracing::warn!(
            "Found negative migration timestamp in history: {}. This indicates corrupted data.",
            version
        );
        0
    } else {
        version as u64
    }
}

/// Safely format a schema-qualified table name for SQL queries
/// This prevents SQL injection by properly escaping SQL identifiers
pub fn format_history_table_name(history_table: &HistoryTable) -> Result<String> {
    // Allow alphanumeric, underscore, and dollar sign (PostgreSQL identifier rules)
    fn is_valid_sql_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {}
            _ => return false,
        }

        chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    }

    if !is_valid_sql_identifier(&history_table.schema) {
        return Err(anyhow::anyhow!(
            "Invalid schema name '{}': must contain only letters, numbers, underscores, and dollar signs, starting with letter or underscore",
            history_table.schema
        ));
    }

    if !is_valid_sql_identifier(&history_table.name) {
        return Err(anyhow::anyhow!(
            "Invalid table name '{}': must contain only letters, numbers, underscores, and dollar signs, starting with letter or underscore",
            history_table.name
        ));
    }

    Ok(format!(
        r#""{}"."{}""#,
        history_table.schema, history_table.name
    ))
}

/// One successfully applied migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub applied_at: DateTime<Utc>,
    pub name: String,
    pub timestamp: u64,
    pub filename: String,
}

/// Append-only log of applied migrations.
///
/// The store owns no connection; every call runs on the connection it is
/// given so that `record` joins whatever transaction is open there.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    table: HistoryTable,
}

impl HistoryStore {
    pub fn new(table: HistoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &HistoryTable {
        &self.table
    }

    /// Create the history table if missing. Idempotent.
    pub async fn ensure<D: HistoryBackend>(&self, db: &mut D) -> Result<()> {
        format_history_table_name(&self.table)?;
        db.ensure_history(&self.table).await.with_context(|| {
            format!(
                "Failed to create migration history table {}.{}",
                self.table.schema, self.table.name
            )
        })
    }

    pub async fn latest<D: HistoryBackend>(&self, db: &mut D) -> Result<Option<HistoryRecord>> {
        db.latest_record(&self.table)
            .await
            .context("Failed to read the latest applied migration")
    }

    /// The reconciliation boundary: highest applied timestamp, if any.
    pub async fn latest_timestamp<D: HistoryBackend>(&self, db: &mut D) -> Result<Option<u64>> {
        Ok(self.latest(db).await?.map(|record| record.timestamp))
    }

    /// Number of applied migrations. Only used for reporting, so a failing
    /// query counts as zero.
    pub async fn count<D: HistoryBackend>(&self, db: &mut D) -> u64 {
        match db.count_records(&self.table).await {
            Ok(count) => count,
            Err(e) => {
                debug!("Counting applied migrations failed, reporting 0: {:#}", e);
                0
            }
        }
    }

    /// Append one row for `migration`.
    pub async fn record<D: HistoryBackend>(
        &self,
        db: &mut D,
        migration: &MigrationDescriptor,
    ) -> Result<()> {
        version_to_db(migration.timestamp)?;
        db.insert_record(&self.table, migration)
            .await
            .with_context(|| format!("Failed to record migration {}", migration.filename))
    }
}
