//! Core error types for focusguard-core.
//!
//! This module defines the error hierarchy using thiserror. Only
//! [`CoreError::InvalidInput`] is meant to reach the user; every other
//! variant aborts a single monitoring tick and is logged.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected caller input (e.g. an empty goal).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Content could not be sampled from the current target
    #[error("Extraction unavailable: {0}")]
    Extraction(#[from] ExtractionError),

    /// Relevance oracle failures
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification sink failed to deliver a notice
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors outside the oracle path
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Reasons a tick could not obtain page content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No active target to sample
    #[error("no active content target")]
    NoTarget,

    /// The target produced no visible text
    #[error("target produced no content")]
    EmptyContent,

    /// Fetching the target failed
    #[error("failed to fetch {url}: {message}")]
    FetchFailed { url: String, message: String },
}

/// Relevance oracle failures. None of these are fatal to the loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Connection refused, DNS failure, reset, ...
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    /// No response within the bounded wait
    #[error("oracle did not answer within {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status
    #[error("oracle rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Body did not match the response contract
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be decoded
    #[error("Corrupt value for key '{key}': {message}")]
    CorruptValue { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine the data directory
    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl OracleError {
    /// Classify a reqwest failure into the oracle taxonomy.
    pub fn from_transport(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            OracleError::Timeout { timeout_secs }
        } else if err.is_decode() {
            OracleError::MalformedResponse(err.to_string())
        } else {
            OracleError::Unreachable(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_is_user_facing() {
        let err = CoreError::InvalidInput("goal must not be empty".into());
        assert_eq!(err.to_string(), "Invalid input: goal must not be empty");
    }

    #[test]
    fn oracle_errors_wrap_into_core() {
        let err: CoreError = OracleError::Rejected {
            status: 500,
            message: "Failed to analyze focus".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Oracle(OracleError::Rejected { status: 500, .. })));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn extraction_error_wraps_into_core() {
        let err: CoreError = ExtractionError::NoTarget.into();
        assert_eq!(err.to_string(), "Extraction unavailable: no active content target");
    }
}
