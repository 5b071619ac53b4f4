use crate::config::Config;
use crate::migration::Scaffolder;
use crate::progress::RunReporter;
use anyhow::Result;
use tracing::info;

/// Scaffold a migration named after `words` joined with `-`.
///
/// Only the migrations directory is touched; no database connection is made.
pub async fn cmd_new(config: &Config, words: &[String], skip_payload: bool) -> Result<()> {
    let name = words.join("-");
    info!("Creating migration {:?}", name);

    let migration = Scaffolder::new(&config.migrations.directory)
        .create(Some(name.as_str()), skip_payload)
        .await?;

    RunReporter::new(false).print_created(&migration);
    Ok(())
}
