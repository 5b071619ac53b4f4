/// Tests against a real PostgreSQL server. They run only when DATABASE_URL
/// is set.
pub mod history_store;
pub mod postgres_runner;
