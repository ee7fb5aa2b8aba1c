use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use contacts_common::{Error, Result};
use rusqlite::Connection;
use tracing::info;

use crate::migrations::{self, MigrationError, MigrationReport, MigrationSource};

/// The process-wide database handle.
///
/// Built once at startup and shared by `Arc` with the migration runner and
/// the contact store. All access is serialized through the inner mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening database at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;
        Self::configure(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("database lock poisoned".into()))
    }

    /// Apply pending migrations from an already resolved `source`.
    pub fn apply_migrations(
        &self,
        source: &MigrationSource,
    ) -> std::result::Result<MigrationReport, MigrationError> {
        let mut conn = self.lock_for_migrations()?;
        migrations::apply_pending(&mut conn, source)
    }

    fn lock_for_migrations(
        &self,
    ) -> std::result::Result<MutexGuard<'_, Connection>, MigrationError> {
        self.conn
            .lock()
            .map_err(|_| MigrationError::Connection("database lock poisoned".into()))
    }
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime('now') produces "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn file_backed_database_runs_bundled_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("contacts.db")).unwrap();
        let source = MigrationSource::new(crate::migrations::source::bundled_dir());

        let first = db.apply_migrations(&source).unwrap();
        assert!(!first.applied.is_empty());

        let second = db.apply_migrations(&source).unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped, first.applied);
    }

    #[test]
    fn migrations_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.db");
        let source = MigrationSource::new(crate::migrations::source::bundled_dir());

        let applied = Database::open(&path)
            .unwrap()
            .apply_migrations(&source)
            .unwrap()
            .applied;

        let reopened = Database::open(&path).unwrap();
        let report = reopened.apply_migrations(&source).unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped, applied);
    }

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let sqlite = parse_datetime("2024-03-05 10:20:30".to_string());
        assert_eq!(sqlite.year(), 2024);
        assert_eq!(sqlite.hour(), 10);

        let rfc = parse_datetime("2024-03-05T10:20:30+02:00".to_string());
        assert_eq!(rfc.hour(), 8);
    }
}
