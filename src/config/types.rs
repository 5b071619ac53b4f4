use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub database: Option<DatabaseInput>,
    pub migrations: Option<MigrationsInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database: Database,
    pub migrations: Migrations,
}

// Database configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseInput {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Connection URL. When absent the connection is built from the
    /// libpq `PG*` environment variables.
    pub url: Option<String>,
}

// Migration configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MigrationsInput {
    pub directory: Option<String>,
    pub history_table: Option<HistoryTableInput>,
    pub transactional: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistoryTableInput {
    pub schema: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Migrations {
    pub directory: PathBuf,
    pub history_table: HistoryTable,
    /// Run every migration of an `up` inside a single transaction
    pub transactional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTable {
    pub schema: String,
    pub name: String,
}

// CLI argument groups
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    #[arg(long, global = true, help = "Database URL (defaults to PG* environment variables)")]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MigrationsArgs {
    #[arg(long, short = 'm', global = true, help = "Migrations directory path")]
    pub migrations: Option<String>,

    #[arg(long, short = 'p', global = true, help = "Migration history table name")]
    pub table: Option<String>,

    #[arg(long, global = true, help = "Schema holding the migration history table")]
    pub schema: Option<String>,
}

/// Lower-case a table name given on the command line and drop every
/// character that is not `[0-9a-z_]`.
pub fn normalize_table_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_ascii_lowercase() || *c == '_')
        .collect()
}

// Conversion functions from CLI args to config input
impl From<DatabaseArgs> for DatabaseInput {
    fn from(args: DatabaseArgs) -> Self {
        Self {
            url: args.database_url,
        }
    }
}

impl From<MigrationsArgs> for MigrationsInput {
    fn from(args: MigrationsArgs) -> Self {
        let history_table = if args.table.is_some() || args.schema.is_some() {
            Some(HistoryTableInput {
                schema: args.schema,
                name: args.table.as_deref().map(normalize_table_name),
            })
        } else {
            None
        };

        Self {
            directory: args.migrations,
            history_table,
            transactional: None,
        }
    }
}
