use sqlx::PgPool;
use upmig::config::HistoryTable;
use upmig::db::PgDatabase;
use uuid::Uuid;

/// Connection to the PostgreSQL server named by `DATABASE_URL`
pub struct PgTestInstance {
    pub base_url: String,
}

/// An isolated, throwaway database on the test server
pub struct TestDatabase {
    pool: PgPool,
    db_name: String,
    base_url: String,
    pub url: String,
}

impl TestDatabase {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A fresh single-connection backend for the runner
    pub async fn connect(&self) -> anyhow::Result<PgDatabase> {
        PgDatabase::connect(Some(&self.url)).await
    }

    /// History table with a unique name so tests never share state
    pub fn unique_history_table(&self) -> HistoryTable {
        HistoryTable {
            schema: "public".to_string(),
            name: format!("upmig_{}", Uuid::new_v4().simple()),
        }
    }

    pub async fn table_exists(&self, name: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .unwrap_or(false)
    }

    pub async fn history_count(&self, table: &HistoryTable) -> i64 {
        sqlx::query_scalar(&format!(
            r#"SELECT COUNT(*) FROM "{}"."{}""#,
            table.schema, table.name
        ))
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to count history rows: {}", e))
    }

    /// Drop the database - best effort
    pub async fn cleanup(self) {
        self.pool.close().await;

        let db_name = self.db_name.clone();
        let base_url = self.base_url.clone();

        let cleanup_future = async move {
            if let Ok(pool) = PgPool::connect(&base_url).await {
                let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", db_name);
                let _ = sqlx::query(&drop_sql).execute(&pool).await;
                pool.close().await;
            }
        };

        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), cleanup_future).await;
    }
}

impl PgTestInstance {
    /// `None` when `DATABASE_URL` is not set, so database tests are skipped
    /// on machines without PostgreSQL.
    pub fn from_env() -> Option<Self> {
        dotenv::dotenv().ok();
        std::env::var("DATABASE_URL")
            .ok()
            .map(|base_url| Self { base_url })
    }

    pub async fn create_test_database(&self) -> TestDatabase {
        let db_name = format!("upmig_test_{}", Uuid::new_v4().simple());

        let base_pool = PgPool::connect(&self.base_url)
            .await
            .expect("Failed to connect to PostgreSQL for database creation");

        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name))
            .execute(&base_pool)
            .await
            .expect("Failed to create test database");

        base_pool.close().await;

        let url = match self.base_url.rfind('/') {
            Some(last_slash) => format!("{}/{}", &self.base_url[..last_slash], db_name),
            None => format!("{}/{}", self.base_url, db_name),
        };

        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to connect to newly created test database");

        TestDatabase {
            pool,
            db_name,
            base_url: self.base_url.clone(),
            url,
        }
    }
}

/// Run a test against a fresh database that is dropped afterwards.
///
/// ```ignore
/// #[tokio::test]
/// async fn test_something() -> Result<()> {
///     with_test_db(async |db| {
///         let mut conn = db.connect().await?;
///         conn.execute("CREATE TABLE users (id INT)").await?;
///         Ok(())
///     })
///     .await
/// }
/// ```
pub async fn with_test_db<F>(test_fn: F) -> anyhow::Result<()>
where
    F: std::ops::AsyncFnOnce(&TestDatabase) -> anyhow::Result<()>,
{
    let Some(pg) = PgTestInstance::from_env() else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return Ok(());
    };
    let db = pg.create_test_database().await;

    let result = test_fn(&db).await;

    db.cleanup().await;

    result
}
