//! Memweave error types

use thiserror::Error;

/// Memweave error type
///
/// Only conditions that stop a run surface here. Per-chunk and per-stage
/// inference problems are absorbed by the lens layer and recorded in the
/// persisted stage artifacts instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No transcript exists for the requested date
    #[error("No transcript found for {date}")]
    InputMissing { date: String },

    /// Date key is not a valid YYYY-MM-DD date
    #[error("Invalid date key: {0}")]
    InvalidDate(String),

    /// Another run for the same date is active in this pipeline
    #[error("A run for {date} is already in progress")]
    RunInProgress { date: String },

    /// Persistence layer error
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error means "nothing to do" rather than a failed run.
    pub fn is_input_missing(&self) -> bool {
        matches!(self, Error::InputMissing { .. })
    }
}

/// Result type alias for Memweave operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_missing_is_distinct() {
        let missing = Error::InputMissing {
            date: "2026-01-02".to_string(),
        };
        assert!(missing.is_input_missing());
        assert_eq!(missing.to_string(), "No transcript found for 2026-01-02");

        let other = Error::Store("disk full".to_string());
        assert!(!other.is_input_missing());
    }
}
