use std::time::Duration;

// Scaffolding retry timing
pub const SCAFFOLD_RETRY_DELAY: Duration = Duration::from_millis(50);

// Migration directory layout
pub const UNIT_EXTENSION: &str = "yaml";
pub const SQL_SUBDIR: &str = "sql";
pub const SQL_EXTENSION: &str = "sql";
pub const TEMPLATE_FILENAME: &str = "template.stub";

// Scaffold defaults
pub const UNNAMED_MIGRATION: &str = "unnamed";
pub const PLACEHOLDER_SQL: &str = "-- SQL";

// History table defaults
pub const DEFAULT_HISTORY_SCHEMA: &str = "public";
pub const DEFAULT_HISTORY_TABLE: &str = "pg_upmig";

// Configuration file name
pub const CONFIG_FILENAME: &str = "upmig.yaml";

/// Contents written to `template.stub` the first time a migrations directory
/// is bootstrapped. Every new unit starts as a copy of this file.
pub const TEMPLATE_CONTENTS: &str = "\
# upmig migration unit
#
# With no keys set, the unit runs the SQL payload sharing its file name
# under sql/ (sql/<timestamp>_<name>.sql).
#
# payload: sql/some_other_file.sql
# sql: |
#   SELECT 1;
";
