use crate::commands::connect_migrator;
use crate::config::Config;
use crate::progress::RunReporter;
use anyhow::Result;
use tracing::{info, warn};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// Aligned, colored lines
    #[default]
    Human,
    /// The pending report as JSON
    Json,
}

pub async fn cmd_list(
    config: &Config,
    with_history: bool,
    format: ListFormat,
    quiet: bool,
) -> Result<()> {
    info!("Listing pending migrations");

    let mut migrator = connect_migrator(config).await?;
    let result = migrator.pending().await;

    if let Err(e) = migrator.release().await {
        warn!("Failed to close database connection: {:#}", e);
    }

    let report = result?;
    match format {
        ListFormat::Human => RunReporter::new(quiet).print_pending(&report, with_history),
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
