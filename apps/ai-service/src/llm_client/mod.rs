//! LLM Client: the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Orchestrators obtain a `ChatClient` from the registry and only ever see
//! `ModelOutput`; provider wire formats stay inside this module.
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod registry;

#[cfg(test)]
pub mod testing;

/// Sampling temperature used for every provider call.
pub const TEMPERATURE: f32 = 0.7;
pub(crate) const MAX_TOKENS: u32 = 4096;

/// Failure while invoking a provider. Never retried by this layer.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Closed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Anthropic];

    pub fn id(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Model used when no override is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => gemini::DEFAULT_MODEL,
            Provider::OpenAi => openai::DEFAULT_MODEL,
            Provider::Anthropic => anthropic::DEFAULT_MODEL,
        }
    }

    /// Environment variable that carries this provider's API key.
    pub fn credential_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported LLM provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.id() == normalized)
            .ok_or_else(|| UnknownProvider(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Joins all system messages; providers that take a top-level system field use this.
pub(crate) fn system_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One piece of a multi-part model response.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSegment {
    Text(String),
    /// A structured block; only its `text` field (if any) carries content.
    Structured(Value),
}

/// Raw model output as returned by a provider, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Text(String),
    Segments(Vec<OutputSegment>),
}

/// A provider chat-completion endpoint bound to a model and credential.
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    /// Sends role-tagged messages and returns the raw generated output.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelOutput, LlmError>;
}

/// Reads an unsuccessful response body and turns it into `LlmError::Api`,
/// using `extract` to pull a readable message out of the provider's error JSON.
pub(crate) async fn api_error(
    response: reqwest::Response,
    extract: fn(&str) -> Option<String>,
) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = extract(&body).unwrap_or(body);
    LlmError::Api { status, message }
}
