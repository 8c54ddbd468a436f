//! Error types for ShopBuddy
//!
//! Component calls never surface these to the user: the pipeline maps
//! call and parse failures to fixed fallback replies at each component
//! boundary. Only configuration errors are fatal, and only at startup.

use thiserror::Error;

/// Main error type for the assistant
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Remote model call failed
    #[error("Model call failed: {0}")]
    CallFailure(String),

    /// Model call exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Model output did not have the expected shape
    #[error("Could not parse model output: {0}")]
    ParseFailure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Pipeline state machine transition errors
    #[error("Invalid state transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssistantError::Timeout { duration_ms: 1500 };
        assert!(err.to_string().contains("1500"));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = AssistantError::InvalidTransition {
            from: "Classify".to_string(),
            event: "ScoreAccepted".to_string(),
        };
        assert!(err.to_string().contains("Classify"));
        assert!(err.to_string().contains("ScoreAccepted"));
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "facts.toml");
        let err: AssistantError = io.into();
        assert!(matches!(err, AssistantError::IoError(_)));
        assert!(err.to_string().contains("facts.toml"));
    }
}
