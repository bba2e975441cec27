use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::registry::ClientResolver;
use crate::retrieval::store::ChunkStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Resolves the provider client per request. Default: ProviderRegistry.
    pub resolver: Arc<dyn ClientResolver>,
    pub chunks: Arc<ChunkStore>,
}
