use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_PROVIDER: &str = "gemini";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_MAX_WORKERS: usize = 10;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Built once in `main` and handed to each component by reference.
/// Provider credentials are optional here; the registry rejects a request
/// whose resolved provider has no key.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Lower-cased provider id used when a request does not name one.
    pub ai_provider: String,
    /// Overrides the per-provider default model when set.
    pub ai_model: Option<String>,
    pub port: u16,
    pub chunk_store_path: PathBuf,
    pub max_workers: usize,
    pub llm_timeout_secs: u64,
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "<set>"),
            )
            .field("ai_provider", &self.ai_provider)
            .field("ai_model", &self.ai_model)
            .field("port", &self.port)
            .field("chunk_store_path", &self.chunk_store_path)
            .field("max_workers", &self.max_workers)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("RAG_SERVICE_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .context("RAG_SERVICE_PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let max_workers = match get("MAX_WORKERS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("MAX_WORKERS must be a positive integer")?
                .max(1),
            None => DEFAULT_MAX_WORKERS,
        };

        let llm_timeout_secs = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };

        Ok(Config {
            gemini_api_key: get("GEMINI_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            ai_provider: get("AI_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            ai_model: get("AI_MODEL").map(|m| m.trim().to_string()),
            port,
            chunk_store_path: get("CHUNK_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("chunk_store")),
            max_workers,
            llm_timeout_secs,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
