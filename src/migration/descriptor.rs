use crate::constants::{SQL_EXTENSION, SQL_SUBDIR, UNIT_EXTENSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A migration known from the migrations directory.
///
/// `filename` is the `<timestamp>_<name>` identifier shared by the unit file
/// and its SQL payload; `timestamp` is the only ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDescriptor {
    pub timestamp: u64,
    pub name: String,
    pub filename: String,
}

impl MigrationDescriptor {
    pub fn new(timestamp: u64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            filename: format!("{}_{}", timestamp, name),
            timestamp,
            name,
        }
    }

    /// File name of the executable unit, e.g. `1700000000000_add-users.yaml`
    pub fn unit_file_name(&self) -> String {
        format!("{}.{}", self.filename, UNIT_EXTENSION)
    }

    pub fn unit_path(&self, migrations_dir: &Path) -> PathBuf {
        migrations_dir.join(self.unit_file_name())
    }

    /// Default location of the SQL payload, relative to the migrations directory
    pub fn payload_relative_path(&self) -> PathBuf {
        Path::new(SQL_SUBDIR).join(format!("{}.{}", self.filename, SQL_EXTENSION))
    }

    pub fn payload_path(&self, migrations_dir: &Path) -> PathBuf {
        migrations_dir.join(self.payload_relative_path())
    }
}

/// Parse a unit filename like "1700000000000_add-users.yaml".
///
/// Returns `None` for anything that is not `<digits>_<name>.yaml` with a
/// non-empty name, which is how the template and stray files are ignored.
pub fn parse_unit_filename(filename: &str) -> Option<MigrationDescriptor> {
    let stem = filename
        .strip_suffix(UNIT_EXTENSION)?
        .strip_suffix('.')?;

    let (digits, name) = stem.split_once('_')?;

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) || name.is_empty() {
        return None;
    }

    let timestamp = digits.parse::<u64>().ok()?;

    Some(MigrationDescriptor {
        timestamp,
        name: name.to_string(),
        filename: stem.to_string(),
    })
}
