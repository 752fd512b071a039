//! Vector index and document source traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DocentResult;
use crate::types::{DocumentChunk, MetadataFilter, VectorHit};

/// Distance metric for vector similarity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

/// Nearest-neighbour index over chunk embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` hits ordered by ascending distance.
    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> DocentResult<Vec<VectorHit>>;

    /// Insert or replace chunks with their embeddings. Slices are parallel.
    async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> DocentResult<()>;

    /// Get the collection name.
    fn collection_name(&self) -> &str;
}

/// Full-snapshot reader used to build the term index.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Return every stored chunk matching `filter`, up to `limit`.
    async fn get_all_documents(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> DocentResult<Vec<DocumentChunk>>;
}

/// Vector store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: VectorStoreProvider,
    /// Collection name.
    #[serde(default = "default_collection")]
    pub collection_name: String,
    /// Server URL for remote stores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Distance metric.
    #[serde(default)]
    pub distance: DistanceMetric,
    /// Provider-specific configuration.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

fn default_collection() -> String {
    "it_assets".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::default(),
            collection_name: default_collection(),
            url: None,
            distance: DistanceMetric::default(),
            config: serde_json::Value::Null,
        }
    }
}

/// Vector store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VectorStoreProvider {
    #[default]
    Chroma,
    InMemory,
}
