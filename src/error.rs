//! Error types for keytree

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type.
///
/// Absent keys are not errors: point `get`s return `None` and `delete`
/// returns `false`. Only construction and persistence can fail.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction or header configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error during load/save
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record payload encode/decode error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed persisted data (bad header, truncated or oversized record)
    #[error("Corrupt index data: {0}")]
    Corrupt(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a corrupt-data error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }
}
