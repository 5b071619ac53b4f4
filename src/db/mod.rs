//! Database capability required by the migration runner.
//!
//! The runner never talks to a driver directly. It needs a single connection
//! that can run SQL batches and delimit a transaction ([`Database`]), plus a
//! place to persist the migration history ([`HistoryBackend`]).

pub mod connection;
pub mod error_context;
pub mod memory;
pub mod postgres;

use crate::config::HistoryTable;
use crate::migration::MigrationDescriptor;
use crate::migration_tracking::HistoryRecord;
use anyhow::Result;
use std::future::Future;

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

/// One live database connection.
///
/// Transactions are connection-scoped: everything executed between
/// [`Database::begin`] and [`Database::commit`] / [`Database::rollback`]
/// belongs to the same unit of work.
pub trait Database: Send {
    /// Execute a batch of one or more SQL statements.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send;

    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// Storage for the append-only migration history.
///
/// Writes go through the same connection as the migrations themselves so that
/// a history row commits or rolls back together with the migration it records.
pub trait HistoryBackend: Database {
    /// Create the history table if it does not exist yet.
    fn ensure_history(&mut self, table: &HistoryTable)
    -> impl Future<Output = Result<()>> + Send;

    /// Most recent record by migration timestamp.
    fn latest_record(
        &mut self,
        table: &HistoryTable,
    ) -> impl Future<Output = Result<Option<HistoryRecord>>> + Send;

    fn count_records(&mut self, table: &HistoryTable) -> impl Future<Output = Result<u64>> + Send;

    fn insert_record(
        &mut self,
        table: &HistoryTable,
        migration: &MigrationDescriptor,
    ) -> impl Future<Output = Result<()>> + Send;
}
