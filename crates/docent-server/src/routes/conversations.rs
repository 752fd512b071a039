//! Conversation memory endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use docent_core::memory::{ConversationTurn, MemorySnapshot};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Number of recent turns. `0` returns the whole history.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AppendTurnRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub updates: Map<String, Value>,
}

/// Load recent turns and the profile.
/// GET /conversations/:user_id
pub async fn load_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<MemorySnapshot>> {
    let limit = params
        .limit
        .unwrap_or(state.config().memory.history_limit);
    Ok(Json(state.conversations().load(&user_id, limit)?))
}

/// Record one question/answer turn.
/// POST /conversations/:user_id
pub async fn append_turn(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AppendTurnRequest>,
) -> ApiResult<Json<ConversationTurn>> {
    if request.question.trim().is_empty() {
        return Err(ApiError::validation("Question cannot be empty"));
    }
    let turn = state
        .conversations()
        .append_turn(&user_id, &request.question, &request.answer)?;
    Ok(Json(turn))
}

/// Merge fields into the user's profile.
/// PUT /conversations/:user_id/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Map<String, Value>>> {
    let profile = state
        .conversations()
        .update_profile(&user_id, &request.updates)?;
    Ok(Json(profile))
}
