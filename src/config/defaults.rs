use crate::config::types::*;
use crate::constants::{DEFAULT_HISTORY_SCHEMA, DEFAULT_HISTORY_TABLE};
use std::path::PathBuf;

impl Default for Migrations {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./migrations"),
            history_table: HistoryTable::default(),
            transactional: true,
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self {
            schema: DEFAULT_HISTORY_SCHEMA.to_string(),
            name: DEFAULT_HISTORY_TABLE.to_string(),
        }
    }
}
