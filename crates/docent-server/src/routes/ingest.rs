//! Ingestion endpoint.

use axum::{extract::State, Json};
use docent_core::ingestion::{IngestReport, RawRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for ingestion.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// Dataset label stamped on every chunk.
    pub dataset: String,
    /// Loader output.
    pub documents: Vec<RawRecord>,
    /// Default file type when a record carries none.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Metadata merged into every record.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Response for ingestion.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    #[serde(flatten)]
    pub report: IngestReport,
    /// Term index size after the rebuild.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_documents: Option<usize>,
}

/// Ingest records and rebuild the engine so lexical search sees them.
/// POST /ingest
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    if request.dataset.trim().is_empty() {
        return Err(ApiError::validation("Dataset cannot be empty"));
    }

    let _guard = state.lock_ingest().await;
    let report = state
        .pipeline()
        .ingest(
            request.documents,
            &request.dataset,
            request.metadata.as_ref(),
            request.file_type.as_deref(),
        )
        .await?;

    let engine = if report.count > 0 {
        state.rebuild_engine().await?
    } else {
        state.engine().await
    };

    Ok(Json(IngestResponse {
        report,
        indexed_documents: engine.indexed_documents(),
    }))
}
