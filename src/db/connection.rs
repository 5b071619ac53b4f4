use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Mask password in database URL for display
pub fn mask_url_password(url: &str) -> String {
    // Handle case where URL doesn't contain ://
    if !url.contains("://") {
        return url.to_string();
    }

    let parts: Vec<&str> = url.splitn(2, "://").collect();
    if parts.len() != 2 {
        return url.to_string();
    }

    let protocol = parts[0];
    let rest = parts[1];

    // Check if there's user info (user:pass@host or user@host)
    if let Some(at_pos) = rest.find('@') {
        let user_info = &rest[..at_pos];
        let host_and_path = &rest[at_pos + 1..];

        if let Some(colon_pos) = user_info.find(':') {
            let username = &user_info[..colon_pos];
            return format!("{}://{}:***@{}", protocol, username, host_and_path);
        }
    }

    url.to_string()
}

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum number of retries for database connections
    pub max_retries: u32,
    /// Delay between connection retries
    pub retry_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// Build connect options from an explicit URL, or from the libpq `PG*`
/// environment variables when no URL is configured.
pub fn connect_options(url: Option<&str>) -> Result<PgConnectOptions> {
    let options = match url {
        Some(url) => PgConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", mask_url_password(url)))?,
        None => PgConnectOptions::new(),
    };

    // Migration bodies are logged by the runner itself
    Ok(options.disable_statement_logging())
}

/// Human readable description of where we are connecting, without secrets
pub fn describe_target(url: Option<&str>) -> String {
    match url {
        Some(url) => mask_url_password(url),
        None => "database from PG* environment variables".to_string(),
    }
}

/// Open a single connection, retrying according to `config`.
///
/// Connection failures are surfaced to the caller once the retries are
/// exhausted; with the default config there is exactly one attempt.
pub async fn connect_with_retry_config(
    url: Option<&str>,
    config: &ConnectionConfig,
) -> Result<PgConnection> {
    let options = connect_options(url)?;
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match PgConnection::connect_with(&options).await {
            Ok(conn) => {
                if attempt > 0 {
                    info!(
                        "Connected to database (after {} retr{})",
                        attempt,
                        if attempt == 1 { "y" } else { "ies" }
                    );
                } else {
                    debug!("Connected to {}", describe_target(url));
                }
                return Ok(conn);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < config.max_retries {
                    info!("Database not ready, retrying...");
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    let error = match last_error {
        Some(e) => anyhow::Error::new(e),
        None => anyhow::anyhow!("no connection attempt was made"),
    };

    Err(error.context(format!(
        "Failed to connect to {} after {} attempt{}",
        describe_target(url),
        config.max_retries + 1,
        if config.max_retries == 0 { "" } else { "s" }
    )))
}
