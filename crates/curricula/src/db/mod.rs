//! SQLite persistence for curriculum materials.
//!
//! Every worker process holds one `Database`. Statements from all of its
//! threads run one at a time on the shared connection, and the claim
//! updates in [`material_repo`] rely on that: a conditional UPDATE either
//! changes the row for exactly one caller or for none. Separate worker
//! processes pointed at the same file are kept apart by SQLite's own write
//! lock, which they wait on for up to [`BUSY_TIMEOUT`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod material_repo;
pub mod migrations;

pub use error::DatabaseError;

/// How long a statement waits for another process's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the materials database. Clones share the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the materials file at `path`, creating it and its directory on
    /// first use, and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        // Must be set before WAL: switching journal mode takes the write lock.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let db = Self::migrated(conn)?;
        log::info!("Material database ready at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database, used by unit tests.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection lock. Keep `f` to one logical
    /// operation so claims never wait behind unrelated work.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Where the worker keeps materials when the config names no path:
/// `~/.curricula/data/curricula.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".curricula").join("data").join("curricula.db"))
}
