use crate::helpers::harness::{PgTestInstance, TestDatabase};
use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A temporary project directory to run the `upmig` binary in
pub struct CliTestHelper {
    pub temp_dir: TempDir,
    pub project_root: PathBuf,
    pub database_url: Option<String>,
}

impl CliTestHelper {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project_root = temp_dir.path().to_path_buf();

        Self {
            temp_dir,
            project_root,
            database_url: None,
        }
    }

    pub fn with_database(mut self, db: &TestDatabase) -> Self {
        self.database_url = Some(db.url.clone());
        self
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.project_root.join("migrations")
    }

    /// Command running in the project root, isolated from the caller's
    /// database environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("upmig").unwrap();
        cmd.current_dir(&self.project_root)
            .env_remove("DATABASE_URL")
            .env_remove("UPMIG_MIGRATIONS_DIR")
            .env_remove("UPMIG_TABLE")
            .env_remove("RUST_LOG");
        if let Some(url) = &self.database_url {
            cmd.args(["--database-url", url]);
        }
        cmd
    }

    pub fn write_config(&self, contents: &str) -> Result<()> {
        fs::write(self.project_root.join("upmig.yaml"), contents)?;
        Ok(())
    }

    /// Write a unit using the default payload location
    pub fn write_migration(&self, filename: &str, sql: &str) -> Result<()> {
        let dir = self.migrations_dir();
        fs::create_dir_all(dir.join("sql"))?;
        fs::write(dir.join(format!("{}.yaml", filename)), "")?;
        fs::write(dir.join("sql").join(format!("{}.sql", filename)), sql)?;
        Ok(())
    }

    /// Unit file names, sorted
    pub fn list_migration_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(self.migrations_dir())? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.ends_with(".yaml") {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for CliTestHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a CLI test with a project directory and a fresh database.
/// Skipped when `DATABASE_URL` is not set.
pub async fn with_cli_db<F>(test_fn: F) -> Result<()>
where
    F: std::ops::AsyncFnOnce(&CliTestHelper, &TestDatabase) -> Result<()>,
{
    let Some(pg) = PgTestInstance::from_env() else {
        eprintln!("DATABASE_URL not set, skipping CLI database test");
        return Ok(());
    };
    let db = pg.create_test_database().await;
    let helper = CliTestHelper::new().with_database(&db);

    let result = test_fn(&helper, &db).await;

    db.cleanup().await;
    result
}
