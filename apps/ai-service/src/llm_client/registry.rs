//! Provider Registry: turns a provider id into a ready-to-call `ChatClient`.
//!
//! Resolution never touches the network; the first request to a provider
//! happens inside an orchestrator.

use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, DEFAULT_PROVIDER};
use crate::llm_client::anthropic::AnthropicClient;
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::openai::OpenAiClient;
use crate::llm_client::{ChatClient, Provider, UnknownProvider};

/// Caller-fixable configuration problem. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    UnsupportedProvider(#[from] UnknownProvider),

    #[error("{var} not found in environment variables")]
    MissingCredential {
        provider: Provider,
        var: &'static str,
    },
}

/// Fully resolved provider selection for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: Provider,
    /// `None` means the provider default.
    pub model: Option<String>,
    pub credential: String,
}

impl ProviderConfig {
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Anything that can hand out a chat client for a request.
///
/// Carried in `AppState` as `Arc<dyn ClientResolver>` so tests can swap in a
/// scripted client without touching handlers or orchestrators.
pub trait ClientResolver: Send + Sync {
    fn resolve(&self, requested: Option<&str>) -> Result<Arc<dyn ChatClient>, ConfigurationError>;
}

#[derive(Clone, Default)]
struct Credentials {
    gemini: Option<String>,
    openai: Option<String>,
    anthropic: Option<String>,
}

impl Credentials {
    fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gemini => self.gemini.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
        }
    }
}

/// Default `ClientResolver` backed by the process configuration.
#[derive(Clone)]
pub struct ProviderRegistry {
    http: Client,
    credentials: Credentials,
    default_provider: String,
    model_override: Option<String>,
}

impl ProviderRegistry {
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            credentials: Credentials {
                gemini: config.gemini_api_key.clone(),
                openai: config.openai_api_key.clone(),
                anthropic: config.anthropic_api_key.clone(),
            },
            default_provider: config.ai_provider.clone(),
            model_override: config.ai_model.clone(),
        }
    }

    /// Resolves provider, credential and model without constructing a client.
    ///
    /// Order: explicit argument, then configured default, then `gemini`.
    pub fn resolve_config(&self, requested: Option<&str>) -> Result<ProviderConfig, ConfigurationError> {
        let id = requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or_else(|| Some(self.default_provider.trim()).filter(|id| !id.is_empty()))
            .unwrap_or(DEFAULT_PROVIDER);

        let provider: Provider = id.parse()?;

        let credential = self
            .credentials
            .get(provider)
            .ok_or(ConfigurationError::MissingCredential {
                provider,
                var: provider.credential_var(),
            })?
            .to_string();

        Ok(ProviderConfig {
            provider,
            model: self.model_override.clone(),
            credential,
        })
    }

    fn connect(&self, config: ProviderConfig) -> Arc<dyn ChatClient> {
        let model = config.model_or_default().to_string();
        match config.provider {
            Provider::Gemini => Arc::new(GeminiClient::new(
                self.http.clone(),
                config.credential,
                model,
            )),
            Provider::OpenAi => Arc::new(OpenAiClient::new(
                self.http.clone(),
                config.credential,
                model,
            )),
            Provider::Anthropic => Arc::new(AnthropicClient::new(
                self.http.clone(),
                config.credential,
                model,
            )),
        }
    }
}

impl ClientResolver for ProviderRegistry {
    fn resolve(&self, requested: Option<&str>) -> Result<Arc<dyn ChatClient>, ConfigurationError> {
        let config = self.resolve_config(requested)?;
        info!(
            "Initializing {} client (model: {})",
            config.provider,
            config.model_or_default()
        );
        Ok(self.connect(config))
    }
}
