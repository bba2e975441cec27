//! Axum route handlers for the chunk store.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::resume::ResumeRecord;
use crate::retrieval::store::DEFAULT_TOP_K;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoreChunksRequest {
    pub owner_id: String,
    #[serde(default)]
    pub texts: Vec<String>,
    /// Optional resume whose summary and experience entries are stored as passages.
    #[serde(default)]
    pub resume: Option<ResumeRecord>,
}

#[derive(Debug, Serialize)]
pub struct StoreChunksResponse {
    pub owner_id: String,
    pub ids: Vec<String>,
}

fn default_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize)]
pub struct QueryChunksRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Debug, Serialize)]
pub struct QueryChunksResponse {
    pub chunks: Vec<String>,
}

/// POST /api/v1/chunks
pub async fn handle_store_chunks(
    State(state): State<AppState>,
    AppJson(request): AppJson<StoreChunksRequest>,
) -> Result<Json<StoreChunksResponse>, AppError> {
    let owner_id = request.owner_id.trim();
    if owner_id.is_empty() {
        return Err(AppError::Validation("owner_id cannot be empty".to_string()));
    }

    let mut texts = request.texts;
    if let Some(resume) = &request.resume {
        texts.extend(resume.passages());
    }
    if texts.iter().all(|t| t.trim().is_empty()) {
        return Err(AppError::Validation(
            "nothing to store: provide texts or a resume".to_string(),
        ));
    }

    let ids = state.chunks.store(owner_id, &texts).await?;

    Ok(Json(StoreChunksResponse {
        owner_id: owner_id.to_string(),
        ids,
    }))
}

/// POST /api/v1/chunks/query
pub async fn handle_query_chunks(
    State(state): State<AppState>,
    AppJson(request): AppJson<QueryChunksRequest>,
) -> Result<Json<QueryChunksResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    let chunks = state.chunks.query(&request.query, request.k).await;
    Ok(Json(QueryChunksResponse { chunks }))
}
