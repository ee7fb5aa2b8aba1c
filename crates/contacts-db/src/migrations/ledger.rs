use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, params};
use serde::Serialize;

use super::error::MigrationError;
use crate::database::parse_datetime;

/// A row of the `schema_migrations` ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: String,
    pub applied_at: DateTime<Utc>,
}

/// Create the ledger table if it is missing. Safe to call on every startup.
pub fn ensure_schema(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT NOT NULL PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(MigrationError::SchemaSetup)
}

/// Every version recorded so far.
pub fn load_applied(conn: &Connection) -> Result<HashSet<String>, MigrationError> {
    let mut stmt = conn
        .prepare("SELECT version FROM schema_migrations")
        .map_err(MigrationError::LedgerRead)?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(MigrationError::LedgerRead)?;

    rows.collect::<Result<HashSet<_>, _>>()
        .map_err(MigrationError::LedgerRead)
}

/// Ledger rows ordered by version.
pub fn list_applied(conn: &Connection) -> Result<Vec<AppliedMigration>, MigrationError> {
    let mut stmt = conn
        .prepare("SELECT version, applied_at FROM schema_migrations ORDER BY version ASC")
        .map_err(MigrationError::LedgerRead)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(AppliedMigration {
                version: row.get(0)?,
                applied_at: parse_datetime(row.get::<_, String>(1)?),
            })
        })
        .map_err(MigrationError::LedgerRead)?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(MigrationError::LedgerRead)
}

/// Record `version` inside the transaction that applied it, so content and
/// bookkeeping commit or roll back together.
pub fn record_applied(tx: &Transaction<'_>, version: &str) -> Result<(), MigrationError> {
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        params![version],
    )
    .map(|_| ())
    .map_err(|source| MigrationError::Record {
        version: version.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn empty_ledger_loads_empty_set() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        assert!(load_applied(&conn).unwrap().is_empty());
        assert!(list_applied(&conn).unwrap().is_empty());
    }

    #[test]
    fn load_without_table_is_a_ledger_read_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = load_applied(&conn).unwrap_err();
        assert!(matches!(err, MigrationError::LedgerRead(_)));
    }

    #[test]
    fn recorded_versions_are_visible_after_commit() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let tx = conn.transaction().unwrap();
        record_applied(&tx, "001_init.sql").unwrap();
        record_applied(&tx, "002_more.sql").unwrap();
        tx.commit().unwrap();

        let applied = load_applied(&conn).unwrap();
        assert!(applied.contains("001_init.sql"));
        assert!(applied.contains("002_more.sql"));

        let rows = list_applied(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].version, "001_init.sql");
    }

    #[test]
    fn uncommitted_record_is_discarded() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        {
            let tx = conn.transaction().unwrap();
            record_applied(&tx, "001_init.sql").unwrap();
            // dropped without commit
        }

        assert!(load_applied(&conn).unwrap().is_empty());
    }

    #[test]
    fn duplicate_version_is_a_record_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let tx = conn.transaction().unwrap();
        record_applied(&tx, "001_init.sql").unwrap();
        let err = record_applied(&tx, "001_init.sql").unwrap_err();
        assert_eq!(err.version(), Some("001_init.sql"));
        assert!(matches!(err, MigrationError::Record { .. }));
    }
}
