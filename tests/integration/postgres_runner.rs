use crate::helpers::harness::{TestDatabase, with_test_db};
use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use upmig::config::Migrations;
use upmig::db::PgDatabase;
use upmig::migrate::{Migrator, RunOptions};
use upmig::migration::DirectorySource;

fn write_migration(dir: &Path, filename: &str, sql: &str) -> Result<()> {
    fs::create_dir_all(dir.join("sql"))?;
    fs::write(dir.join(format!("{}.yaml", filename)), "")?;
    fs::write(dir.join("sql").join(format!("{}.sql", filename)), sql)?;
    Ok(())
}

async fn open_migrator(
    db: &TestDatabase,
    dir: &Path,
    transactional: bool,
) -> Result<(Migrator<PgDatabase, DirectorySource>, Migrations)> {
    let config = Migrations {
        directory: dir.to_path_buf(),
        history_table: db.unique_history_table(),
        transactional,
    };
    let migrator = Migrator::from_directory(db.connect().await?, &config);
    Ok((migrator, config))
}

#[tokio::test]
async fn test_up_applies_in_order_and_records_history() -> Result<()> {
    with_test_db(async |db| {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        write_migration(dir, "10_users", "CREATE TABLE users (id INT PRIMARY KEY);")?;
        write_migration(
            dir,
            "20_posts",
            "CREATE TABLE posts (id INT PRIMARY KEY, user_id INT REFERENCES users(id));\n\
             CREATE INDEX posts_user_idx ON posts(user_id);",
        )?;

        let (mut migrator, config) = open_migrator(db, dir, true).await?;
        let report = migrator.up(&RunOptions::default()).await?;
        migrator.release().await?;

        assert!(report.is_complete());
        assert_eq!(report.applied.len(), 2);
        assert!(db.table_exists("users").await);
        assert!(db.table_exists("posts").await);
        assert_eq!(db.history_count(&config.history_table).await, 2);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_failure_rolls_back_everything() -> Result<()> {
    with_test_db(async |db| {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        write_migration(dir, "10_ok", "CREATE TABLE survives_not (id INT);")?;
        write_migration(dir, "20_broken", "CREATE TABLE broken (id NOT_A_TYPE);")?;
        write_migration(dir, "30_never", "CREATE TABLE never (id INT);")?;

        let (mut migrator, config) = open_migrator(db, dir, true).await?;
        let report = migrator.up(&RunOptions::default()).await?;

        assert_eq!(report.applied.len(), 1);
        assert_eq!(
            report.failure.as_ref().map(|f| f.migration.filename.as_str()),
            Some("20_broken")
        );
        assert!(report.persisted().is_empty());

        // The connection is usable again after the rollback
        let pending = migrator.pending().await?;
        assert_eq!(pending.pending.len(), 3);
        assert_eq!(pending.history, 0);
        migrator.release().await?;

        assert!(!db.table_exists("survives_not").await);
        assert_eq!(db.history_count(&config.history_table).await, 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_failure_without_transaction_keeps_earlier_migrations() -> Result<()> {
    with_test_db(async |db| {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        write_migration(dir, "10_kept", "CREATE TABLE kept (id INT);")?;
        write_migration(dir, "20_broken", "SELECT * FROM missing_table;")?;

        let (mut migrator, config) = open_migrator(db, dir, false).await?;
        let report = migrator.up(&RunOptions::default()).await?;
        migrator.release().await?;

        assert_eq!(report.persisted().len(), 1);
        assert!(db.table_exists("kept").await);
        assert_eq!(db.history_count(&config.history_table).await, 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_high_water_mark_across_runs() -> Result<()> {
    with_test_db(async |db| {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        write_migration(dir, "10_a", "CREATE TABLE a (id INT);")?;
        write_migration(dir, "20_b", "CREATE TABLE b (id INT);")?;
        write_migration(dir, "30_c", "CREATE TABLE c (id INT);")?;

        let (mut migrator, _config) = open_migrator(db, dir, true).await?;

        let report = migrator
            .up(&RunOptions {
                steps: None,
                to: Some(20),
            })
            .await?;
        assert_eq!(report.applied.len(), 2);

        // Dated before the high-water mark, so never picked up
        write_migration(dir, "15_late", "CREATE TABLE late (id INT);")?;

        let pending = migrator.pending().await?;
        let names: Vec<&str> = pending.pending.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec!["30_c"]);
        assert_eq!(pending.last.map(|r| r.filename), Some("20_b".to_string()));

        migrator.up(&RunOptions::default()).await?;
        migrator.release().await?;

        assert!(db.table_exists("c").await);
        assert!(!db.table_exists("late").await);
        Ok(())
    })
    .await
}
