pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;

use crate::generation::handlers as generation;
use crate::retrieval::handlers as retrieval;
use crate::state::AppState;

/// Every route shares one pool of `max_workers` permits.
pub fn build_router(state: AppState) -> Router {
    let workers = GlobalConcurrencyLimitLayer::new(state.config.max_workers);

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume operations
        .route("/api/v1/resumes/tailor", post(generation::handle_tailor))
        .route("/api/v1/resumes/analyze", post(generation::handle_analyze))
        .route(
            "/api/v1/resumes/interview-questions",
            post(generation::handle_interview_questions),
        )
        // Chunk store
        .route("/api/v1/chunks", post(retrieval::handle_store_chunks))
        .route("/api/v1/chunks/query", post(retrieval::handle_query_chunks))
        .layer(workers)
        .with_state(state)
}
