//! Errors of the address book database.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot open address book '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot create address book directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The file was last migrated by a newer release.
    #[error("Address book schema v{found} is newer than supported v{supported}")]
    NewerSchema { found: u32, supported: u32 },

    #[error("Database lock poisoned")]
    LockPoisoned,
}
