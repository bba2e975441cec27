//! Anthropic Messages API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    api_error, system_text, ChatClient, ChatMessage, LlmError, ModelOutput, OutputSegment,
    Provider, Role, MAX_TOKENS, TEMPERATURE,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<Value>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<AnthropicError>(body)
        .ok()
        .map(|e| e.error.message)
}

/// Turns content blocks into output segments. `text` blocks become plain
/// text; everything else is kept as a structured segment.
fn to_segments(blocks: Vec<Value>) -> Vec<OutputSegment> {
    blocks
        .into_iter()
        .map(|block| {
            let is_text = block.get("type").and_then(Value::as_str) == Some("text");
            match block.get("text").and_then(Value::as_str) {
                Some(text) if is_text => OutputSegment::Text(text.to_string()),
                _ => OutputSegment::Structured(block),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelOutput, LlmError> {
        let system = system_text(messages);
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: &system,
            messages: messages
                .iter()
                .filter(|m| m.role == Role::User)
                .map(|m| AnthropicMessage {
                    role: "user",
                    content: &m.content,
                })
                .collect(),
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response, error_message).await);
        }

        let body: AnthropicResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            debug!(
                "Anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        if body.content.is_empty() {
            return Err(LlmError::EmptyContent);
        }

        Ok(ModelOutput::Segments(to_segments(body.content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_blocks_become_text_segments() {
        let segments = to_segments(vec![
            json!({"type": "text", "text": "{\"a\": 1}"}),
            json!({"type": "tool_use", "id": "t1", "input": {}}),
        ]);
        assert_eq!(segments[0], OutputSegment::Text("{\"a\": 1}".to_string()));
        assert!(matches!(segments[1], OutputSegment::Structured(_)));
    }

    #[test]
    fn test_error_message_extracts_api_message() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad model"}}"#;
        assert_eq!(error_message(body), Some("bad model".to_string()));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_request_carries_fixed_temperature() {
        let request = AnthropicRequest {
            model: DEFAULT_MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: "sys",
            messages: vec![AnthropicMessage {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["system"], "sys");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
