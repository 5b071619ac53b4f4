pub mod bootstrap;
pub mod catalog;
pub mod descriptor;
pub mod scaffold;
pub mod unit;

pub use bootstrap::bootstrap_directory;
pub use catalog::{FileCatalog, discover_migrations};
pub use descriptor::{MigrationDescriptor, parse_unit_filename};
pub use scaffold::{Scaffolder, sanitize_migration_name};
pub use unit::{
    DirectorySource, FnMigration, Migration, MigrationSource, SqlMigration, StaticSource,
    UnitManifest,
};
