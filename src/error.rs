//! Error types for Triad
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in Triad
#[derive(Debug, Error)]
pub enum TriadError {
    /// Task text was empty or whitespace
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Round limit outside 1..=limit
    #[error("Invalid round limit: {rounds} (must be between 1 and {limit})")]
    InvalidRounds { rounds: u32, limit: u32 },

    /// Session not found in the registry
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Registry is full of live sessions
    #[error("Session capacity reached: {0} sessions")]
    CapacityExceeded(usize),

    /// Inference backend error outside of a loop run
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Triad operations
pub type Result<T> = std::result::Result<T, TriadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_task_error() {
        let err = TriadError::InvalidTask("task cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid task: task cannot be empty");
    }

    #[test]
    fn test_invalid_rounds_error() {
        let err = TriadError::InvalidRounds { rounds: 0, limit: 20 };
        assert_eq!(err.to_string(), "Invalid round limit: 0 (must be between 1 and 20)");
    }

    #[test]
    fn test_session_not_found_error() {
        let err = TriadError::SessionNotFound("1738300800123-a1b2c3d4".to_string());
        assert_eq!(err.to_string(), "Session not found: 1738300800123-a1b2c3d4");
    }

    #[test]
    fn test_capacity_exceeded_error() {
        let err = TriadError::CapacityExceeded(64);
        assert_eq!(err.to_string(), "Session capacity reached: 64 sessions");
    }

    #[test]
    fn test_llm_error_conversion() {
        let err: TriadError = LlmError::EmptyResponse.into();
        assert!(matches!(err, TriadError::Llm(_)));
        assert!(err.to_string().starts_with("LLM error:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TriadError = io_err.into();
        assert!(matches!(err, TriadError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TriadError = json_err.into();
        assert!(matches!(err, TriadError::Json(_)));
    }
}
