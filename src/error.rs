//! Error taxonomy for console operations
//!
//! Every recoverable failure a command can hit is a [`ConsoleError`] value that
//! the caller renders as a single user-visible message. Only [`ConsoleError::FatalLoad`]
//! is meant to stop the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the console layer
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors produced by console operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Malformed or missing input; nothing was executed
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Query text rejected by the read-only policy; nothing was executed
    #[error("{0}")]
    PolicyViolation(String),

    /// Credential mismatch, or a privileged action without a login
    #[error("{0}")]
    Auth(String),

    /// The storage engine rejected a statement
    #[error("SQL execution failed: {0}")]
    SqlExecution(String),

    /// An inference call or query ran past its deadline
    #[error("{operation} timed out after {secs} seconds")]
    Timeout { operation: String, secs: u64 },

    /// The model backend failed while generating
    #[error("inference failed: {0}")]
    Inference(String),

    /// Model or tokenizer could not be loaded
    #[error("failed to load translation model: {0}")]
    FatalLoad(String),
}

/// Severity of a user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl ConsoleError {
    /// Build a validation error for the named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a timeout error for the named operation
    pub fn timeout(operation: impl Into<String>, limit: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs: limit.as_secs(),
        }
    }

    /// Whether the session can continue after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::FatalLoad(_))
    }

    /// How the front-end should present this error
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::Validation { .. } | Self::PolicyViolation(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}

impl From<rusqlite::Error> for ConsoleError {
    fn from(err: rusqlite::Error) -> Self {
        Self::SqlExecution(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = ConsoleError::validation("column 2 name", "must not be empty");
        assert_eq!(err.to_string(), "invalid column 2 name: must not be empty");
        assert_eq!(err.level(), NoticeLevel::Warning);
    }

    #[test]
    fn test_only_fatal_load_is_unrecoverable() {
        assert!(!ConsoleError::FatalLoad("missing".into()).is_recoverable());
        assert!(ConsoleError::SqlExecution("boom".into()).is_recoverable());
        assert!(ConsoleError::Auth("nope".into()).is_recoverable());
    }

    #[test]
    fn test_rusqlite_error_maps_to_sql_execution() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: ConsoleError = conn.execute("SELECT * FROM missing", []).unwrap_err().into();
        assert!(matches!(err, ConsoleError::SqlExecution(msg) if msg.contains("missing")));
    }
}
