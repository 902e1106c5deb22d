// ABOUTME: Configuration loading for the jobledger binary.
// ABOUTME: Reads the database location and lock wait from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JOBLEDGER_BUSY_TIMEOUT_MS is not a whole number of milliseconds: {0}")]
    InvalidBusyTimeout(String),
}

/// Binary configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
}

impl LedgerConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - JOBLEDGER_DB: database file (default: ~/.jobledger/ledger.db)
    /// - JOBLEDGER_BUSY_TIMEOUT_MS: lock wait in milliseconds (default: 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = lookup("JOBLEDGER_DB")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".jobledger")
                    .join("ledger.db")
            });

        let busy_timeout = match lookup("JOBLEDGER_BUSY_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => return Err(ConfigError::InvalidBusyTimeout(raw)),
            },
            None => Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        };

        Ok(Self {
            db_path,
            busy_timeout,
        })
    }
}
