use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            database: match (self.database, other.database) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            migrations: match (self.migrations, other.migrations) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
        }
    }
}

impl DatabaseInput {
    pub fn merge_with(self, other: DatabaseInput) -> DatabaseInput {
        DatabaseInput {
            url: other.url.or(self.url),
        }
    }
}

impl MigrationsInput {
    pub fn merge_with(self, other: MigrationsInput) -> MigrationsInput {
        MigrationsInput {
            directory: other.directory.or(self.directory),
            history_table: match (self.history_table, other.history_table) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
            transactional: other.transactional.or(self.transactional),
        }
    }
}

impl HistoryTableInput {
    pub fn merge_with(self, other: HistoryTableInput) -> HistoryTableInput {
        HistoryTableInput {
            schema: other.schema.or(self.schema),
            name: other.name.or(self.name),
        }
    }
}
