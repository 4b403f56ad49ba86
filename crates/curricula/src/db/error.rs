//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from material persistence.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// A stored column could not be mapped back onto the material model.
    #[error("Corrupt value in column '{column}' of material {id}: {reason}")]
    CorruptRow {
        id: String,
        column: &'static str,
        reason: String,
    },

    /// An update targeted a material that does not exist.
    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}
