use crate::config::HistoryTable;
use crate::db::connection::{ConnectionConfig, connect_with_retry_config};
use crate::db::error_context::SqlFailure;
use crate::db::{Database, HistoryBackend};
use crate::migration::MigrationDescriptor;
use crate::migration_tracking::{
    HistoryRecord, format_history_table_name, version_from_db, version_to_db,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Executor, Row};

/// PostgreSQL backend holding a single connection.
pub struct PgDatabase {
    conn: PgConnection,
}

impl PgDatabase {
    /// Connect with `url`, or with the `PG*` environment variables when `url`
    /// is `None`.
    pub async fn connect(url: Option<&str>) -> Result<Self> {
        Self::connect_with_config(url, &ConnectionConfig::default()).await
    }

    pub async fn connect_with_config(url: Option<&str>, config: &ConnectionConfig) -> Result<Self> {
        let conn = connect_with_retry_config(url, config).await?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Direct access to the underlying connection
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

impl Database for PgDatabase {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        // Raw execute uses the simple protocol, so multi-statement batches work
        match self.conn.execute(sql).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let description = SqlFailure::from_sqlx(&e, sql).render(sql);
                Err(anyhow::Error::new(e).context(description))
            }
        }
    }

    async fn begin(&mut self) -> Result<()> {
        self.conn
            .execute("BEGIN")
            .await
            .context("Failed to begin transaction")?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.conn
            .execute("COMMIT")
            .await
            .context("Failed to commit transaction")?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute("ROLLBACK")
            .await
            .context("Failed to roll back transaction")?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close database connection")
    }
}

impl HistoryBackend for PgDatabase {
    async fn ensure_history(&mut self, table: &HistoryTable) -> Result<()> {
        let table_name = format_history_table_name(table)?;

        self.conn
            .execute(
                format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {} (
                        applied_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
                        name VARCHAR(255) NOT NULL,
                        ts BIGINT NOT NULL,
                        filename TEXT NOT NULL
                    )
                    "#,
                    table_name
                )
                .as_str(),
            )
            .await?;

        Ok(())
    }

    async fn latest_record(&mut self, table: &HistoryTable) -> Result<Option<HistoryRecord>> {
        let table_name = format_history_table_name(table)?;

        let row = sqlx::query(&format!(
            "SELECT applied_at, name, ts, filename FROM {} ORDER BY ts DESC LIMIT 1",
            table_name
        ))
        .fetch_optional(&mut self.conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(HistoryRecord {
            applied_at: row.try_get::<DateTime<Utc>, _>("applied_at")?,
            name: row.try_get("name")?,
            timestamp: version_from_db(row.try_get::<i64, _>("ts")?),
            filename: row.try_get("filename")?,
        }))
    }

    async fn count_records(&mut self, table: &HistoryTable) -> Result<u64> {
        let table_name = format_history_table_name(table)?;

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table_name))
            .fetch_one(&mut self.conn)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn insert_record(
        &mut self,
        table: &HistoryTable,
        migration: &MigrationDescriptor,
    ) -> Result<()> {
        let table_name = format_history_table_name(table)?;

        sqlx::query(&format!(
            "INSERT INTO {} (name, ts, filename) VALUES ($1, $2, $3)",
            table_name
        ))
        .bind(&migration.name)
        .bind(version_to_db(migration.timestamp)?)
        .bind(&migration.filename)
        .execute(&mut self.conn)
        .await?;

        Ok(())
    }
}
