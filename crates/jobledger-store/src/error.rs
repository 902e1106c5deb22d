// ABOUTME: Error type shared by every store operation and transaction scope call.
// ABOUTME: Storage-engine errors pass through untouched; the rest signal caller or consistency faults.

use thiserror::Error;

use crate::transaction::ScopeHandle;

/// Errors that can occur during record store and transaction operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// A write touched a different number of rows than it targeted.
    #[error("{operation} on {table} should have affected {expected} row(s), but {actual} row(s) were affected")]
    Consistency {
        table: &'static str,
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("no active transaction with handle {0}")]
    NoActiveTransaction(ScopeHandle),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
