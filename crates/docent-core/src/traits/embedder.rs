//! Embedder trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DocentError, DocentResult};

/// Text embedding service. Implementations wrap a remote or local model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> DocentResult<Vec<f32>>;

    /// Embed a batch of texts, one vector per input in input order.
    async fn embed_texts(&self, texts: &[String]) -> DocentResult<Vec<Vec<f32>>> {
        // Default implementation: sequential embedding
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_query(text).await?);
        }
        Ok(embeddings)
    }

    /// Get the dimension of the embeddings.
    fn dimension(&self) -> usize;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Check that a batch call returned one vector per input.
pub fn check_batch_shape(expected: usize, embeddings: &[Vec<f32>]) -> DocentResult<()> {
    if embeddings.len() != expected {
        return Err(DocentError::embedding_shape(expected, embeddings.len()));
    }
    Ok(())
}

/// Embedder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: EmbedderProvider,
    /// Model name/identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding dimensions.
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dims() -> usize {
    768
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::default(),
            model: default_model(),
            embedding_dims: default_embedding_dims(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Embedder provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmbedderProvider {
    #[default]
    Ollama,
    OpenAI,
}
