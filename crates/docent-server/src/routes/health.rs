//! Health check endpoint.

use axum::{extract::State, Json};
use docent_core::retrieval::RetrievalMode;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub requested_mode: RetrievalMode,
    pub effective_mode: RetrievalMode,
    pub reranker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_documents: Option<usize>,
    pub version: String,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let engine = state.engine().await;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        requested_mode: engine.config().mode,
        effective_mode: engine.effective_mode(),
        reranker: engine.has_reranker(),
        indexed_documents: engine.indexed_documents(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
