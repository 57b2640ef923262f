//! LLM Client Layer - the inference port and its Ollama implementation
//!
//! This module provides:
//! - Request/response types for the generate API
//! - LlmClient trait for backend abstraction
//! - OllamaClient implementation
//! - MockLlmClient for tests

pub mod client;
pub mod mock;
pub mod ollama;
pub mod types;

pub use client::{CONNECTION_CHECK_PROMPT, LlmClient, LlmError, check_connection, usable_text};
pub use mock::MockLlmClient;
pub use ollama::{OllamaClient, OllamaConfig};
pub use types::{ConnectionCheck, GenerateOptions, GenerateRequest};
