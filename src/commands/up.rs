use crate::commands::connect_migrator;
use crate::config::Config;
use crate::migrate::RunOptions;
use crate::progress::RunReporter;
use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

/// How an `up` run ended. A failed run has already been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpOutcome {
    Completed,
    Failed,
}

pub async fn cmd_up(config: &Config, options: RunOptions, quiet: bool) -> Result<UpOutcome> {
    info!(
        "Applying migrations from {}",
        config.migrations.directory.display()
    );

    let mut migrator = connect_migrator(config).await?;
    let start = Instant::now();
    let result = migrator.up(&options).await;

    if let Err(e) = migrator.release().await {
        warn!("Failed to close database connection: {:#}", e);
    }

    let report = result?;
    let reporter = RunReporter::new(quiet);
    reporter.print_applied(&report, start.elapsed());

    if report.is_complete() {
        Ok(UpOutcome::Completed)
    } else {
        reporter.print_failure(&report);
        Ok(UpOutcome::Failed)
    }
}
