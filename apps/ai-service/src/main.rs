mod config;
mod errors;
mod extract;
mod generation;
mod llm_client;
mod models;
mod retrieval;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::registry::ProviderRegistry;
use crate::retrieval::embedding::HashingEmbedder;
use crate::retrieval::store::ChunkStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Provider credentials are checked per request, not here
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AI service v{}", env!("CARGO_PKG_VERSION"));
    info!("{config:?}");

    // One HTTP client shared by every provider adapter
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.llm_timeout_secs))
        .build()?;
    let resolver = Arc::new(ProviderRegistry::new(&config, http));
    info!("Provider registry initialized (default: {})", config.ai_provider);

    let chunks = ChunkStore::open(&config.chunk_store_path, Arc::new(HashingEmbedder::default())).await?;

    let state = AppState {
        config: config.clone(),
        resolver,
        chunks: Arc::new(chunks),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr} ({} workers)", config.max_workers);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
