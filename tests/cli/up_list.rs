use crate::helpers::cli::with_cli_db;
use anyhow::Result;
use predicates::prelude::*;

#[tokio::test]
async fn test_list_then_up() -> Result<()> {
    with_cli_db(async |helper, db| {
        helper.write_migration("10_first", "CREATE TABLE first (id INT);")?;
        helper.write_migration("20_second", "CREATE TABLE second (id INT);")?;

        helper
            .command()
            .args(["list", "--history"])
            .assert()
            .success()
            .stdout(predicate::str::contains("10_first"))
            .stdout(predicate::str::contains("Pending migrations:"))
            .stdout(predicate::str::contains("2/2 (0 done)"));

        helper
            .command()
            .args(["up", "--steps", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("⇈"))
            .stdout(predicate::str::contains("Migrations completed:"));

        assert!(db.table_exists("first").await);
        assert!(!db.table_exists("second").await);

        helper
            .command()
            .args(["list", "-H"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1/2 (1 done)"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_up_to_identifier() -> Result<()> {
    with_cli_db(async |helper, db| {
        helper.write_migration("10_a", "CREATE TABLE a (id INT);")?;
        helper.write_migration("20_b", "CREATE TABLE b (id INT);")?;
        helper.write_migration("30_c", "CREATE TABLE c (id INT);")?;

        helper
            .command()
            .args(["up", "--to", "20_b"])
            .assert()
            .success();

        assert!(db.table_exists("b").await);
        assert!(!db.table_exists("c").await);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_list_json() -> Result<()> {
    with_cli_db(async |helper, _db| {
        helper.write_migration("10_a", "SELECT 1;")?;

        let output = helper
            .command()
            .args(["list", "--format", "json"])
            .output()?;
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(report["history"], 0);
        assert_eq!(report["pending"][0]["filename"], "10_a");
        assert!(report["last"].is_null());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_failed_up_exits_non_zero() -> Result<()> {
    with_cli_db(async |helper, db| {
        helper.write_migration("10_a", "CREATE TABLE a (id INT);")?;
        helper.write_migration("20_bad", "CREATE TABLE bad (id NOT_A_TYPE);")?;

        helper
            .command()
            .arg("up")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Migrations completed:"))
            .stderr(predicate::str::contains("Migration failed 20_bad"))
            .stderr(predicate::str::contains("rolled back"));

        assert!(!db.table_exists("a").await);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_custom_table_name_is_normalized() -> Result<()> {
    with_cli_db(async |helper, db| {
        helper.write_migration("10_a", "SELECT 1;")?;

        helper
            .command()
            .args(["--table", "Team-Migrations", "up"])
            .assert()
            .success();

        assert!(db.table_exists("teammigrations").await);
        Ok(())
    })
    .await
}
