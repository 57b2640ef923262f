//! Mapping from crate errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::TriadError;

/// Error returned by route handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl From<TriadError> for ApiError {
    fn from(e: TriadError) -> Self {
        let status = match &e {
            TriadError::InvalidTask(_) | TriadError::InvalidRounds { .. } => StatusCode::BAD_REQUEST,
            TriadError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            TriadError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            TriadError::Llm(_) | TriadError::Io(_) | TriadError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &e {
            TriadError::InvalidTask(_) => "Task cannot be empty".to_string(),
            TriadError::SessionNotFound(_) => "Session not found".to_string(),
            other => other.to_string(),
        };
        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.message }))).into_response()
    }
}
