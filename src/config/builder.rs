use crate::config::{merge::Merge, types::*};
use anyhow::{Result, anyhow};
use std::path::PathBuf;

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            database: self.resolve_database(&defaults.database),
            migrations: self.resolve_migrations(&defaults.migrations)?,
        })
    }

    fn resolve_database(&self, defaults: &Database) -> Database {
        let db_input = self.config_input.database.as_ref();

        let url = db_input
            .and_then(|d| d.url.as_ref())
            .cloned()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .or_else(|| defaults.url.clone());

        Database { url }
    }

    fn resolve_migrations(&self, defaults: &Migrations) -> Result<Migrations> {
        let mig_input = self.config_input.migrations.as_ref();

        let directory = mig_input
            .and_then(|m| m.directory.as_ref())
            .cloned()
            .or_else(|| std::env::var("UPMIG_MIGRATIONS_DIR").ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| defaults.directory.clone());

        let table_input = mig_input.and_then(|m| m.history_table.as_ref());
        let history_table = HistoryTable {
            schema: table_input
                .and_then(|t| t.schema.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.history_table.schema.clone()),
            name: table_input
                .and_then(|t| t.name.as_ref())
                .cloned()
                .or_else(|| std::env::var("UPMIG_TABLE").ok())
                .unwrap_or_else(|| defaults.history_table.name.clone()),
        };

        if history_table.name.is_empty() {
            return Err(anyhow!(
                "Migration history table name is empty. Use --table or set migrations.history_table.name in the config file"
            ));
        }

        let transactional = mig_input
            .and_then(|m| m.transactional)
            .unwrap_or(defaults.transactional);

        Ok(Migrations {
            directory,
            history_table,
            transactional,
        })
    }
}
