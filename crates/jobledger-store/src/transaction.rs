// ABOUTME: Per-unit-of-work transaction scopes with nesting via SQLite savepoints.
// ABOUTME: Store calls route through the unit's connection, so open scopes pick up their writes.

use std::fmt;

use rusqlite::Connection;

use crate::error::StoreError;

/// Identifies one open scope within a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeHandle(u64);

impl ScopeHandle {
    pub fn get(self) -> u64 {
        self.0
    }

    fn savepoint(self) -> String {
        format!("scope_{}", self.0)
    }
}

impl fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The transactional context of one logical unit of work.
///
/// Each manager owns a dedicated connection. Store operations issued through
/// it run inside the innermost open scope, or auto-commit individually when
/// no scope is open. Concurrent units of work each hold their own manager.
///
/// The outermost scope is a real transaction (`BEGIN IMMEDIATE`); nested
/// scopes are savepoints. Closing a scope also closes every scope nested
/// inside it.
pub struct TransactionManager {
    conn: Connection,
    scopes: Vec<ScopeHandle>,
    next_handle: u64,
}

impl TransactionManager {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            conn,
            scopes: Vec::new(),
            next_handle: 0,
        }
    }

    /// Open a scope nested inside the currently active one.
    pub fn start(&mut self) -> Result<ScopeHandle, StoreError> {
        let handle = ScopeHandle(self.next_handle + 1);

        if self.scopes.is_empty() {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
        } else {
            self.conn
                .execute_batch(&format!("SAVEPOINT {}", handle.savepoint()))?;
        }

        self.next_handle = handle.0;
        self.scopes.push(handle);
        tracing::debug!("started scope {} at depth {}", handle, self.scopes.len());
        Ok(handle)
    }

    /// Apply the writes of `handle` and of every scope nested inside it.
    /// Writes become durable once the outermost scope commits.
    pub fn commit(&mut self, handle: ScopeHandle) -> Result<(), StoreError> {
        let depth = self.depth_of(handle)?;

        let result = if depth == 0 {
            self.conn.execute_batch("COMMIT")
        } else {
            self.conn
                .execute_batch(&format!("RELEASE {}", handle.savepoint()))
        };

        self.finish(handle, depth, "committed", result)
    }

    /// Discard the writes of `handle` and of every scope nested inside it.
    pub fn rollback(&mut self, handle: ScopeHandle) -> Result<(), StoreError> {
        let depth = self.depth_of(handle)?;

        let result = if depth == 0 {
            self.conn.execute_batch("ROLLBACK")
        } else {
            let name = handle.savepoint();
            self.conn
                .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))
        };

        self.finish(handle, depth, "rolled back", result)
    }

    /// The innermost open scope, or `None` when operations auto-commit.
    pub fn active_scope(&self) -> Option<ScopeHandle> {
        self.scopes.last().copied()
    }

    pub fn open_scopes(&self) -> &[ScopeHandle] {
        &self.scopes
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` so that either all of its writes apply or none do, whether or
    /// not a scope is open. Used for single multi-row statements whose
    /// outcome is only known after they run.
    pub(crate) fn all_or_nothing<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.conn.execute_batch("SAVEPOINT all_or_nothing")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("RELEASE all_or_nothing")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO all_or_nothing; RELEASE all_or_nothing")
                {
                    tracing::error!("rolling back failed statement failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    fn depth_of(&self, handle: ScopeHandle) -> Result<usize, StoreError> {
        self.scopes
            .iter()
            .position(|open| *open == handle)
            .ok_or(StoreError::NoActiveTransaction(handle))
    }

    fn finish(
        &mut self,
        handle: ScopeHandle,
        depth: usize,
        outcome: &str,
        result: rusqlite::Result<()>,
    ) -> Result<(), StoreError> {
        match result {
            Ok(()) => {
                self.scopes.truncate(depth);
                tracing::debug!("{} scope {} at depth {}", outcome, handle, depth + 1);
                Ok(())
            }
            Err(e) => {
                // SQLite may have ended the transaction on its own.
                if self.conn.is_autocommit() {
                    self.scopes.clear();
                }
                Err(e.into())
            }
        }
    }
}

impl Drop for TransactionManager {
    fn drop(&mut self) {
        if self.scopes.is_empty() || self.conn.is_autocommit() {
            return;
        }
        tracing::warn!(
            "unit of work dropped with {} open scope(s); rolling back",
            self.scopes.len()
        );
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::error!("rollback on drop failed: {}", e);
        }
    }
}
