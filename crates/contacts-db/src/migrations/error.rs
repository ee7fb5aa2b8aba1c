use std::path::PathBuf;

use thiserror::Error;

/// Every way a migration run can stop. All variants are fatal to the run.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// No usable migrations directory could be resolved.
    #[error("migrations directory not configured or not found: {0}")]
    Configuration(String),

    #[error("migrations directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("failed to list migrations in {}", .path.display())]
    ListFiles {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create schema_migrations table")]
    SchemaSetup(#[source] rusqlite::Error),

    #[error("failed to read applied migrations")]
    LedgerRead(#[source] rusqlite::Error),

    #[error("failed to read migration file {version}")]
    FileRead {
        version: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to begin transaction for migration {version}")]
    Transaction {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("migration {version} failed")]
    Execution {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to record migration {version}")]
    Record {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The commit itself failed; whether the migration landed must be checked by hand.
    #[error("failed to commit migration {version}, database state needs manual inspection")]
    Commit {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database connection unavailable: {0}")]
    Connection(String),
}

impl MigrationError {
    /// The migration file this error is attributed to, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::FileRead { version, .. }
            | Self::Transaction { version, .. }
            | Self::Execution { version, .. }
            | Self::Record { version, .. }
            | Self::Commit { version, .. } => Some(version),
            _ => None,
        }
    }
}

impl From<MigrationError> for contacts_common::Error {
    fn from(err: MigrationError) -> Self {
        // Flatten the source chain so the message survives the String variant.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        contacts_common::Error::Migration(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_reported_for_per_file_errors() {
        let err = MigrationError::FileRead {
            version: "003_seed.sql".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.version(), Some("003_seed.sql"));

        let err = MigrationError::Configuration("nothing found".into());
        assert_eq!(err.version(), None);
    }

    #[test]
    fn conversion_keeps_source_message() {
        let err = MigrationError::FileRead {
            version: "003_seed.sql".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let common: contacts_common::Error = err.into();
        assert_eq!(
            common.to_string(),
            "migration error: failed to read migration file 003_seed.sql: denied"
        );
    }
}
