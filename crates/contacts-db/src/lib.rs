pub mod contact_store;
pub mod database;
pub mod migrations;

pub use contact_store::ContactStore;
pub use database::Database;
pub use migrations::{
    AppliedMigration, MigrationError, MigrationFile, MigrationReport, MigrationSource,
    run_migrations,
};
