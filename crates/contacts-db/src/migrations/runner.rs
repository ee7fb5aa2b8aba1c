use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use super::error::MigrationError;
use super::ledger;
use super::source::{MigrationFile, MigrationSource};

/// Outcome of a completed run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// Apply every migration in `source` that the ledger does not know yet.
///
/// Files run in byte-wise file name order, each inside its own transaction
/// together with its ledger insert. The first failure aborts the run; files
/// committed before it stay committed.
pub fn apply_pending(
    conn: &mut Connection,
    source: &MigrationSource,
) -> Result<MigrationReport, MigrationError> {
    info!("using migrations directory {}", source.dir().display());

    ledger::ensure_schema(conn)?;

    let mut files = source.list()?;
    files.sort_by(|a, b| a.version.as_bytes().cmp(b.version.as_bytes()));

    let applied = ledger::load_applied(conn)?;
    let mut report = MigrationReport::default();

    for file in &files {
        if applied.contains(&file.version) {
            info!("migration {} already applied, skipping", file.version);
            report.skipped.push(file.version.clone());
            continue;
        }

        apply_one(conn, file)?;
        report.applied.push(file.version.clone());
    }

    info!(
        "migrations complete: {} applied, {} already present",
        report.applied.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn apply_one(conn: &mut Connection, file: &MigrationFile) -> Result<(), MigrationError> {
    let sql = std::fs::read_to_string(&file.path).map_err(|source| MigrationError::FileRead {
        version: file.version.clone(),
        source,
    })?;

    info!("applying migration {}", file.version);

    let tx = conn
        .transaction()
        .map_err(|source| MigrationError::Transaction {
            version: file.version.clone(),
            source,
        })?;

    let outcome = tx
        .execute_batch(&sql)
        .map_err(|source| MigrationError::Execution {
            version: file.version.clone(),
            source,
        })
        .and_then(|()| ledger::record_applied(&tx, &file.version));

    if let Err(err) = outcome {
        if let Err(rollback_err) = tx.rollback() {
            warn!("rollback of migration {} failed: {rollback_err}", file.version);
        }
        return Err(err);
    }

    tx.commit().map_err(|source| MigrationError::Commit {
        version: file.version.clone(),
        source,
    })?;

    info!("migration {} applied", file.version);
    Ok(())
}
