//! Language model provider seam
//!
//! The engine only needs one call shape: system prompt + messages in, text
//! and token accounting out. Failures carry an HTTP-like status so callers
//! can log them, but every failure is treated the same way upstream: fall
//! back to deterministic generation.

pub mod openrouter;
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Message;

pub use openrouter::OpenRouterProvider;
pub use schema::{normalize_model_output, schema_reminder, ModelDraft, SchemaError};

/// One completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Prompt size in characters, used for cost estimates
    pub fn prompt_chars(&self) -> usize {
        self.system_prompt.chars().count()
            + self.messages.iter().map(|m| m.content.chars().count()).sum::<usize>()
    }
}

/// Completion text plus accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
}

/// Provider failure
#[derive(Debug, Clone, Error)]
#[error("LLM provider error ({}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "no status".to_string()))]
pub struct LlmError {
    pub status: Option<u16>,
    pub message: String,
}

impl LlmError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn call(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;
}

/// Stand-in used when no API key is configured; every call fails fast
#[derive(Debug, Default, Clone)]
pub struct UnavailableProvider;

#[async_trait]
impl LlmProvider for UnavailableProvider {
    async fn call(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Err(LlmError::new(Some(503), "no language model provider configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_provider_fails_with_status() {
        let request = LlmRequest {
            model: "any".to_string(),
            system_prompt: "sys".to_string(),
            messages: vec![Message::user("hello")],
            max_tokens: 10,
        };
        assert_eq!(request.prompt_chars(), 8);
        let err = UnavailableProvider.call(&request).await.unwrap_err();
        assert_eq!(err.status, Some(503));
        assert!(err.to_string().contains("503"));
    }
}
