//! Connection bootstrap for the SQLite graph backend.
//!
//! # Responsibility
//! - Hand out configured connections with the `nodes` schema in place.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A `SqliteGraphStore` is only built over a connection that went through here.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or migrating a graph database.
#[derive(Debug)]
pub enum DbError {
    /// Connection-level SQLite failure (open, pragma, transaction).
    Sqlite(rusqlite::Error),
    /// A migration script failed; the transaction was rolled back.
    MigrationFailed {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::MigrationFailed { version, source } => {
                write!(f, "graph migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "graph schema version {db_version} is newer than this build ({latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn migration_failure_names_version_and_keeps_source() {
        let err = DbError::MigrationFailed {
            version: 3,
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().starts_with("graph migration 3 failed"));
        assert!(err.source().is_some());
    }
}
