use std::path::PathBuf;

use thiserror::Error;

/// Rejected user input. Never leaves the ledger or its store modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("category must not be empty")]
    EmptyCategory,
    #[error("amount must be greater than zero (got {0})")]
    NonPositiveAmount(f64),
    #[error("amount must be a finite number")]
    NonFiniteAmount,
    #[error("`{0}` is not a valid amount")]
    InvalidAmount(String),
    #[error("month index {0} is out of range (expected 0-11)")]
    InvalidMonth(u32),
    #[error("`{0}` is not a valid date")]
    InvalidDate(String),
    #[error("`{0}` is not a usable date format")]
    InvalidDateFormat(String),
}

/// Storage failures. These are reported as warnings; the in-memory ledger stays authoritative.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error on `{path}`: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serde(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serde {
            path: path.into(),
            source,
        }
    }
}

/// Error type returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failures reading or writing the user configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
