pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod migrate;
pub mod migration;
pub mod migration_tracking;
pub mod progress;
