//! Error types for the order-flow forensics engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the forensics engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed field in an input record.
    #[error("Parse error in record {index}, field `{field}`: {reason}")]
    Parse {
        /// Zero-based index of the offending record.
        index: usize,
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Configuration error (non-positive threshold, inconsistent bounds).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (structurally invalid payload).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error for the record at `index`.
    pub fn parse(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Error::Parse {
            index,
            field,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Index of the offending record, for parse errors.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            Error::Parse { index, .. } => Some(*index),
            _ => None,
        }
    }
}
