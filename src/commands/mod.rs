pub mod list;
pub mod new;
pub mod up;

pub use list::{ListFormat, cmd_list};
pub use new::cmd_new;
pub use up::{UpOutcome, cmd_up};

use crate::config::Config;
use crate::db::PgDatabase;
use crate::migrate::Migrator;
use crate::migration::DirectorySource;
use anyhow::Result;

/// Connect to the configured database and wrap it in a directory-backed
/// migrator.
pub(crate) async fn connect_migrator(
    config: &Config,
) -> Result<Migrator<PgDatabase, DirectorySource>> {
    let db = PgDatabase::connect(config.database.url.as_deref()).await?;
    Ok(Migrator::from_directory(db, &config.migrations))
}
