use crate::migration::MigrationDescriptor;
use crate::migration_tracking::HistoryRecord;
use serde::Serialize;

/// Migrations that still have to run, given the high-water mark of the
/// history.
///
/// `catalog` must be sorted ascending by timestamp. Everything strictly after
/// `latest` is pending; a migration file dated at or before the last applied
/// one is never picked up, even if it never ran.
pub fn pending(
    latest: Option<u64>,
    mut catalog: Vec<MigrationDescriptor>,
) -> Vec<MigrationDescriptor> {
    let Some(latest) = latest else {
        return catalog;
    };

    let cut = catalog.partition_point(|m| m.timestamp <= latest);
    catalog.split_off(cut)
}

/// Result of a pending query, with enough history context for `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingReport {
    pub pending: Vec<MigrationDescriptor>,
    /// Number of applied migrations
    pub history: u64,
    /// Most recently applied migration
    pub last: Option<HistoryRecord>,
}

impl PendingReport {
    /// Applied plus pending
    pub fn total(&self) -> u64 {
        self.history + self.pending.len() as u64
    }
}
