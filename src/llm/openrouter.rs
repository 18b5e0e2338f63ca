//! OpenAI-compatible chat completions client (OpenRouter by default)

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{LlmError, LlmProvider, LlmRequest, LlmResponse};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions provider
#[derive(Clone)]
pub struct OpenRouterProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::new(None, format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url
                .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
        })
    }
}

/// Pull the assistant text out of a chat completions body.
///
/// Content may be a string or an array of typed parts.
pub(crate) fn extract_content(body: &serde_json::Value) -> String {
    let content = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    match content {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| {
                if part.get("type").and_then(|t| t.as_str()) == Some("text") {
                    part.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

fn usage_tokens(body: &serde_json::Value, field: &str) -> u32 {
    body.get("usage")
        .and_then(|u| u.get(field))
        .and_then(|v| v.as_u64())
        .map(|v| v.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn call(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: &request.system_prompt,
        });
        for m in &request.messages {
            messages.push(ChatMessage {
                role: m.role.to_openai_string(),
                content: &m.content,
            });
        }
        let payload = ChatRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            response_format: serde_json::json!({"type": "json_object"}),
        };

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", "draftwise")
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::new(e.status().map(|s| s.as_u16()), format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::new(Some(status.as_u16()), body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::new(Some(status.as_u16()), format!("invalid response body: {}", e)))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let model = body
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(request.model.as_str())
            .to_string();
        debug!("{} answered in {}ms", model, latency_ms);

        Ok(LlmResponse {
            text: extract_content(&body),
            provider: "openrouter".to_string(),
            model,
            input_tokens: usage_tokens(&body, "prompt_tokens"),
            output_tokens: usage_tokens(&body, "completion_tokens"),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_string_content() {
        let body = serde_json::json!({
            "choices": [{"message": {"content": "{\"drafts\": []}"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40}
        });
        assert_eq!(extract_content(&body), "{\"drafts\": []}");
        assert_eq!(usage_tokens(&body, "prompt_tokens"), 120);
        assert_eq!(usage_tokens(&body, "completion_tokens"), 40);
    }

    #[test]
    fn test_extract_part_content() {
        let body = serde_json::json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "hello "},
                {"type": "image_url", "image_url": {"url": "x"}},
                {"type": "text", "text": "world"}
            ]}}]
        });
        assert_eq!(extract_content(&body), "hello world");
        assert_eq!(usage_tokens(&body, "prompt_tokens"), 0);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let provider = OpenRouterProvider::new(
            "key".to_string(),
            Some("http://localhost:8080/v1/".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }
}
