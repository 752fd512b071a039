//! Answer feedback endpoint.

use axum::{extract::State, Json};
use docent_core::memory::FeedbackRecord;
use docent_core::rbac::Role;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub role: Role,
    pub question: String,
    pub answer: String,
    /// `-1..=1` thumbs or `1..=5` stars.
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, alias = "context_sources")]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
}

/// Record a rating for one answer.
/// POST /feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<FeedbackResponse>> {
    if request.question.trim().is_empty() {
        return Err(ApiError::validation("Question cannot be empty"));
    }

    let mut record = FeedbackRecord::new(
        request.user_id,
        request.role,
        request.question,
        request.answer,
        request.rating,
    )
    .with_sources(request.sources.unwrap_or_default());
    record.comment = request.comment;

    state.feedback().submit(&record)?;
    Ok(Json(FeedbackResponse { status: "ok" }))
}
