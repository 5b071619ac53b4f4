use crate::helpers::harness::with_test_db;
use anyhow::Result;
use upmig::migration::MigrationDescriptor;
use upmig::migration_tracking::HistoryStore;

#[tokio::test]
async fn test_ensure_creates_history_table_once() -> Result<()> {
    with_test_db(async |db| {
        let table = db.unique_history_table();
        let store = HistoryStore::new(table.clone());
        let mut conn = db.connect().await?;

        store.ensure(&mut conn).await?;
        store.ensure(&mut conn).await?;

        assert!(db.table_exists(&table.name).await);
        assert_eq!(db.history_count(&table).await, 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_record_and_latest() -> Result<()> {
    with_test_db(async |db| {
        let store = HistoryStore::new(db.unique_history_table());
        let mut conn = db.connect().await?;
        store.ensure(&mut conn).await?;

        assert_eq!(store.latest(&mut conn).await?, None);

        store
            .record(&mut conn, &MigrationDescriptor::new(1_700_000_000_002, "second"))
            .await?;
        store
            .record(&mut conn, &MigrationDescriptor::new(1_700_000_000_001, "first"))
            .await?;

        let latest = store.latest(&mut conn).await?.expect("a record");
        assert_eq!(latest.timestamp, 1_700_000_000_002);
        assert_eq!(latest.name, "second");
        assert_eq!(latest.filename, "1700000000002_second");
        assert_eq!(store.count(&mut conn).await, 2);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_count_on_missing_table_is_zero() -> Result<()> {
    with_test_db(async |db| {
        let store = HistoryStore::new(db.unique_history_table());
        let mut conn = db.connect().await?;

        assert_eq!(store.count(&mut conn).await, 0);
        assert!(store.latest(&mut conn).await.is_err());
        Ok(())
    })
    .await
}
