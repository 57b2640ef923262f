//! Scripted LlmClient for tests and offline runs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::client::{LlmClient, LlmError, usable_text};
use super::types::GenerateRequest;

type Responder = dyn Fn(&GenerateRequest) -> Result<String, LlmError> + Send + Sync;

enum Script {
    Queue(Mutex<VecDeque<Result<String, LlmError>>>),
    Func(Box<Responder>),
}

/// LlmClient that answers from a script and records every request
pub struct MockLlmClient {
    script: Script,
    models: Result<Vec<String>, LlmError>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockLlmClient {
    /// Answer calls in order from `responses`; calls past the end fail
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self::with_script(Script::Queue(Mutex::new(responses.into())))
    }

    /// Answer every call by invoking `f` on the request
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&GenerateRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self::with_script(Script::Func(Box::new(f)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            models: Ok(vec!["mock-model".to_string()]),
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Models reported by `list_models`
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = Ok(models);
        self
    }

    /// Make `list_models` fail with `error`
    pub fn with_models_error(mut self, error: LlmError) -> Self {
        self.models = Err(error);
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of generate calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn next_response(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| Err(LlmError::InvalidResponse("mock script exhausted".to_string()))),
            Script::Func(f) => f(request),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = self.next_response(&request)?;
        usable_text(Some(&text))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        self.models.clone()
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_answers_in_order() {
        let mock = MockLlmClient::new(vec![Ok("one".into()), Err(LlmError::EmptyResponse)]);
        assert_eq!(mock.generate(GenerateRequest::new("m", "a")).await.unwrap(), "one");
        assert_eq!(
            mock.generate(GenerateRequest::new("m", "b")).await,
            Err(LlmError::EmptyResponse)
        );
        assert!(mock.generate(GenerateRequest::new("m", "c")).await.is_err());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_from_fn_sees_request() {
        let mock = MockLlmClient::from_fn(|req| Ok(format!("echo: {}", req.prompt)));
        let text = mock.generate(GenerateRequest::new("m", "ping")).await.unwrap();
        assert_eq!(text, "echo: ping");
        assert_eq!(mock.requests()[0].prompt, "ping");
    }

    #[tokio::test]
    async fn test_blank_script_answer_is_empty_response() {
        let mock = MockLlmClient::new(vec![Ok("   ".into())]);
        assert_eq!(
            mock.generate(GenerateRequest::new("m", "a")).await,
            Err(LlmError::EmptyResponse)
        );
    }

    #[tokio::test]
    async fn test_list_models() {
        let mock = MockLlmClient::new(vec![]).with_models(vec!["a".into(), "b".into()]);
        assert_eq!(mock.list_models().await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_list_models_error() {
        let mock = MockLlmClient::new(vec![]).with_models_error(LlmError::Network("refused".into()));
        assert_eq!(mock.list_models().await, Err(LlmError::Network("refused".into())));
    }
}
