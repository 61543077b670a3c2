//! Error types for agentrank-store

use thiserror::Error;

/// Error type for progression storage and scoring operations
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Store is not open (failed initialization or already closed)
    #[error("Store unavailable")]
    Unavailable,

    /// Configuration value rejected during initialization
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Grade outside the closed value set
    #[error("Invalid grade: {0} (expected one of -1, 1, 2, 5)")]
    InvalidGrade(i64),

    /// Legacy store migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Legacy key could not be parsed
    #[error("Malformed legacy key: {0}")]
    LegacyKey(String),

    /// Notification collaborator rejected an event
    #[error("Notification error: {0}")]
    Notify(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ProgressError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for progression operations
pub type Result<T> = std::result::Result<T, ProgressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProgressError::Database("connection failed".into());
        assert!(err.to_string().contains("connection failed"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ProgressError = io_err.into();
        assert!(matches!(err, ProgressError::Io(_)));
    }

    #[test]
    fn test_invalid_grade_names_value() {
        let err = ProgressError::InvalidGrade(3);
        assert!(err.to_string().contains("3"));
    }
}
