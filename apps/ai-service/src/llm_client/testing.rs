//! In-process test doubles for `ChatClient` and `ClientResolver`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::registry::{ClientResolver, ConfigurationError};
use super::{ChatClient, ChatMessage, LlmError, ModelOutput, Provider};

/// Returns a fixed output (or a fixed API failure) and records what it was sent.
pub struct ScriptedClient {
    reply: Result<ModelOutput, (u16, String)>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl ScriptedClient {
    fn build(reply: Result<ModelOutput, (u16, String)>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::with_output(ModelOutput::Text(text.to_string()))
    }

    /// Replies with `text` after sleeping for `delay`.
    pub fn replying_after(text: &str, delay: Duration) -> Arc<Self> {
        Self::build(Ok(ModelOutput::Text(text.to_string())), delay)
    }

    pub fn with_output(output: ModelOutput) -> Arc<Self> {
        Self::build(Ok(output), Duration::ZERO)
    }

    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        Self::build(Err((status, message.to_string())), Duration::ZERO)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of `complete` calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelOutput, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.reply {
            Ok(output) => Ok(output.clone()),
            Err((status, message)) => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Resolves every request to the same client, or always fails with a fixed error.
pub struct StaticResolver {
    client: Result<Arc<ScriptedClient>, ConfigurationError>,
}

impl StaticResolver {
    pub fn new(client: Arc<ScriptedClient>) -> Self {
        Self { client: Ok(client) }
    }

    pub fn failing(err: ConfigurationError) -> Self {
        Self { client: Err(err) }
    }
}

impl ClientResolver for StaticResolver {
    fn resolve(&self, _requested: Option<&str>) -> Result<Arc<dyn ChatClient>, ConfigurationError> {
        match &self.client {
            Ok(client) => Ok(client.clone() as Arc<dyn ChatClient>),
            Err(err) => Err(err.clone()),
        }
    }
}
