//! Inference port: the trait every text-generation backend implements

use async_trait::async_trait;
use log::{info, warn};

use super::types::{ConnectionCheck, GenerateRequest};

/// Prompt used by the connectivity check
pub const CONNECTION_CHECK_PROMPT: &str = "Say 'Connection OK'";

/// Stateless text generation - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate text for a prompt/system pair. Returned text is trimmed and
    /// never empty.
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError>;

    /// Names of the models the backend can serve
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Default model identifier
    fn model(&self) -> &str;
}

/// Errors that can occur during LLM operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether the backend could not be reached or refused the request
    pub fn is_transport(&self) -> bool {
        matches!(self, LlmError::Status { .. } | LlmError::Network(_) | LlmError::Timeout(_))
    }
}

/// Trim generated text, treating blank output as a failure
pub fn usable_text(raw: Option<&str>) -> Result<String, LlmError> {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(LlmError::EmptyResponse),
    }
}

/// Ask the backend for a trivial completion to confirm it is reachable
pub async fn check_connection(client: &dyn LlmClient) -> ConnectionCheck {
    let request = GenerateRequest::new(client.model(), CONNECTION_CHECK_PROMPT);
    match client.generate(request).await {
        Ok(text) => {
            info!("Connection check succeeded using {}", client.model());
            ConnectionCheck::ok(text)
        }
        Err(e) => {
            warn!("Connection check failed: {}", e);
            ConnectionCheck::failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_usable_text_trims() {
        assert_eq!(usable_text(Some("  hello \n")).unwrap(), "hello");
    }

    #[test]
    fn test_usable_text_rejects_blank() {
        assert_eq!(usable_text(Some("   \n\t")), Err(LlmError::EmptyResponse));
        assert_eq!(usable_text(None), Err(LlmError::EmptyResponse));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Status {
            status: 404,
            message: "model not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: model not found");
        assert_eq!(LlmError::Timeout(120000).to_string(), "Request timed out after 120000ms");
    }

    #[test]
    fn test_llm_error_is_transport() {
        assert!(LlmError::Network("refused".into()).is_transport());
        assert!(LlmError::Timeout(1).is_transport());
        assert!(
            LlmError::Status {
                status: 500,
                message: String::new()
            }
            .is_transport()
        );
        assert!(!LlmError::EmptyResponse.is_transport());
        assert!(!LlmError::InvalidResponse("bad".into()).is_transport());
    }

    #[tokio::test]
    async fn test_check_connection_ok() {
        let client = MockLlmClient::new(vec![Ok("Connection OK".to_string())]);
        let check = check_connection(&client).await;
        assert!(check.connected);
        assert_eq!(check.response.as_deref(), Some("Connection OK"));

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, CONNECTION_CHECK_PROMPT);
        assert!(requests[0].system.is_empty());
    }

    #[tokio::test]
    async fn test_check_connection_failure() {
        let client = MockLlmClient::new(vec![Err(LlmError::Network("connection refused".into()))]);
        let check = check_connection(&client).await;
        assert!(!check.connected);
        assert!(check.error.unwrap().contains("connection refused"));
    }
}
