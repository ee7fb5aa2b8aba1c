//! Embedded schema migrations.
//!
//! Migrations are plain `*.sql` files applied in file name order and tracked
//! in the `schema_migrations` table. Each file runs once, in its own
//! transaction together with its ledger row.
//!
//! There is no cross-process lock: two runners pointed at the same database
//! at once may race on the ledger. Deployments are expected to run a single
//! migrator at a time.

mod error;
pub mod ledger;
pub mod runner;
pub mod source;

use rusqlite::Connection;

use contacts_config::MigrationsConfig;

pub use error::MigrationError;
pub use ledger::AppliedMigration;
pub use runner::{MigrationReport, apply_pending};
pub use source::{MigrationFile, MigrationSource};

/// Resolve the migrations directory from `config` and apply what is pending.
///
/// Directory resolution happens before the connection is touched, so a bad
/// configuration never writes to the database.
pub fn run_migrations(
    conn: &mut Connection,
    config: &MigrationsConfig,
) -> Result<MigrationReport, MigrationError> {
    let source = MigrationSource::resolve(config.dir.as_deref())?;
    apply_pending(conn, &source)
}

/// Applied and not-yet-applied migrations, without changing anything.
///
/// A missing ledger table reads as an empty ledger.
pub fn status(
    conn: &Connection,
    source: &MigrationSource,
) -> Result<(Vec<AppliedMigration>, Vec<MigrationFile>), MigrationError> {
    let applied = if ledger_exists(conn)? {
        ledger::list_applied(conn)?
    } else {
        Vec::new()
    };

    let mut pending: Vec<MigrationFile> = source
        .list()?
        .into_iter()
        .filter(|file| !applied.iter().any(|a| a.version == file.version))
        .collect();
    pending.sort_by(|a, b| a.version.as_bytes().cmp(b.version.as_bytes()));

    Ok((applied, pending))
}

fn ledger_exists(conn: &Connection) -> Result<bool, MigrationError> {
    conn.query_row(
        "SELECT count(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )
    .map_err(MigrationError::LedgerRead)
}
