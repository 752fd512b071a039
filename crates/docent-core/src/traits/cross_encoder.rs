//! Cross-encoder trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DocentResult;

/// Scores (query, passage) pairs jointly. Higher means more relevant.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Score each pair, returning one score per pair in input order.
    async fn compute_score(&self, pairs: &[(String, String)]) -> DocentResult<Vec<f32>>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Cross-encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: RerankerProvider,
    /// Model name/identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the scoring service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "BAAI/bge-reranker-base".to_string()
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            provider: RerankerProvider::default(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Cross-encoder provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RerankerProvider {
    /// Text-embeddings-inference style `/rerank` endpoint.
    #[default]
    #[serde(alias = "huggingface")]
    #[strum(to_string = "tei", serialize = "huggingface")]
    Tei,
    Cohere,
}
