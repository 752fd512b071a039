//! Retrieval endpoint.

use axum::{extract::State, Json};
use docent_core::rbac::{AccessContext, Role};
use docent_core::types::ScoredCandidate;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for retrieval.
#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    /// The query text.
    pub query: String,
    /// Requesting user.
    pub user_id: String,
    /// Requesting role. Unknown labels only see public chunks.
    pub role: Role,
}

/// Response for retrieval.
#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub results: Vec<ScoredCandidate>,
}

/// Retrieve chunks visible to the caller.
/// POST /retrieve
pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> ApiResult<Json<RetrieveResponse>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::validation("Query cannot be empty"));
    }

    let access = AccessContext::new(request.user_id, request.role);
    let engine = state.engine().await;
    let results = engine.retrieve(&request.query, &access).await?;

    Ok(Json(RetrieveResponse { results }))
}
