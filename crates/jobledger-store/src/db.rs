// ABOUTME: Handle to the SQLite database file backing every store.
// ABOUTME: Bootstraps the schema once and hands out one connection per unit of work.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema::SCHEMA;
use crate::transaction::TransactionManager;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// A SQLite database file shared by any number of units of work.
///
/// `Database` holds no connection itself, so it is cheap to clone and send
/// across threads. Each unit of work opens its own connection, which keeps
/// one caller's open transaction from capturing another caller's writes.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Open or create the database at the given path.
    /// Creates parent directories, enables WAL, and applies the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let db = Self {
            path: path.to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        };

        let conn = db.connect()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!("opened database at {}", path.display());
        Ok(db)
    }

    /// How long a unit of work waits for a lock held by another one before
    /// failing with a busy error.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Begin a new logical unit of work with its own connection.
    pub fn unit_of_work(&self) -> Result<TransactionManager, StoreError> {
        Ok(TransactionManager::new(self.connect()?))
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }
}
