//! Ollama API client implementation
//!
//! This module implements the LlmClient trait for a local Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::{LlmClient, LlmError, usable_text};
use super::types::{GenerateRequest, GenerateResponse, TagsResponse};

/// Default Ollama base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model to use
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Configuration for the Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OllamaConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Ollama HTTP client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Fill in the default model when the request leaves it blank
    fn build_request(&self, mut request: GenerateRequest) -> GenerateRequest {
        if request.model.is_empty() {
            request.model = self.config.model.clone();
        }
        request.stream = false;
        request
    }

    /// Extract the generated text from an `/api/generate` body
    fn parse_response(&self, body: Value) -> Result<String, LlmError> {
        let parsed: GenerateResponse =
            serde_json::from_value(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        usable_text(parsed.response.as_deref())
    }

    fn map_transport(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout.as_millis() as u64)
        } else {
            LlmError::Network(e.to_string())
        }
    }

    /// Check the status code and decode the JSON body
    async fn read_json<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, LlmError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
        let body = self.build_request(request);
        debug!(
            "POST /api/generate model={} prompt_chars={} system_chars={}",
            body.model,
            body.prompt.len(),
            body.system.len()
        );

        let response = self
            .client
            .post(self.endpoint("api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let value: Value = self.read_json(response).await?;
        self.parse_response(value)
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(self.endpoint("api/tags"))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let tags: TagsResponse = self.read_json(response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}
