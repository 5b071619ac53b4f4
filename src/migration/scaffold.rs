use crate::constants::{PLACEHOLDER_SQL, SCAFFOLD_RETRY_DELAY, UNNAMED_MIGRATION};
use crate::migration::bootstrap::{bootstrap_directory, template_path};
use crate::migration::catalog::discover_migrations;
use crate::migration::descriptor::MigrationDescriptor;
use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Keep `[A-Za-z0-9_- ]`, turn runs of spaces into a single `-`.
/// Nothing left (or nothing given) yields `unnamed`.
pub fn sanitize_migration_name(name: Option<&str>) -> String {
    let kept: String = name
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect();

    let mut sanitized = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c == ' ' {
            if !in_space {
                sanitized.push('-');
            }
            in_space = true;
        } else {
            sanitized.push(c);
            in_space = false;
        }
    }

    if sanitized.is_empty() {
        UNNAMED_MIGRATION.to_string()
    } else {
        sanitized
    }
}

/// Creates new timestamped migration units.
pub struct Scaffolder {
    directory: PathBuf,
    clock: Clock,
    retry_delay: Duration,
}

impl Scaffolder {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            clock: Box::new(now_millis),
            retry_delay: SCAFFOLD_RETRY_DELAY,
        }
    }

    /// Replace the millisecond clock used to stamp new migrations.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create a migration unit named after `name`, plus a placeholder SQL
    /// payload unless `skip_payload` is set.
    ///
    /// If the generated timestamp is already used by another unit, waits and
    /// tries again with a fresh timestamp. Existing files are never
    /// overwritten.
    pub async fn create(
        &self,
        name: Option<&str>,
        skip_payload: bool,
    ) -> Result<MigrationDescriptor> {
        bootstrap_directory(&self.directory)?;

        let name = sanitize_migration_name(name);
        let template_file = template_path(&self.directory);
        let template = std::fs::read(&template_file)
            .with_context(|| format!("Failed to read template {}", template_file.display()))?;

        let migration = loop {
            let candidate = MigrationDescriptor::new((self.clock)(), name.as_str());

            if self.timestamp_taken(candidate.timestamp)? {
                debug!(
                    "Timestamp {} already used, retrying in {:?}",
                    candidate.timestamp, self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            let unit_path = candidate.unit_path(&self.directory);
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&unit_path)
            {
                Ok(mut file) => {
                    file.write_all(&template)
                        .with_context(|| format!("Failed to write {}", unit_path.display()))?;
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} appeared concurrently, retrying", unit_path.display());
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to create {}", unit_path.display()));
                }
            }
        };

        if !skip_payload {
            let payload_path = migration.payload_path(&self.directory);
            if !payload_path.exists() {
                std::fs::write(&payload_path, PLACEHOLDER_SQL)
                    .with_context(|| format!("Failed to write {}", payload_path.display()))?;
            }
        }

        debug!("Created migration {}", migration.filename);
        Ok(migration)
    }

    fn timestamp_taken(&self, timestamp: u64) -> Result<bool> {
        Ok(discover_migrations(&self.directory)?
            .iter()
            .any(|m| m.timestamp == timestamp))
    }
}
