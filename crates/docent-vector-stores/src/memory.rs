//! Brute-force in-process vector index.
//!
//! Keeps chunks and embeddings in insertion order and scans all of them on
//! every query. Suitable for tests, demos and corpora of a few thousand
//! chunks.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{DistanceMetric, DocumentSource, VectorIndex, VectorStoreConfig};
use docent_core::types::{DocumentChunk, MetadataFilter, VectorHit};

struct Entry {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// In-memory implementation of [`VectorIndex`] and [`DocumentSource`].
pub struct InMemoryVectorIndex {
    collection_name: String,
    distance: DistanceMetric,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new(collection_name: impl Into<String>, distance: DistanceMetric) -> Self {
        Self {
            collection_name: collection_name.into(),
            distance,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Create an index from configuration.
    pub fn from_config(config: &VectorStoreConfig) -> Self {
        Self::new(config.collection_name.clone(), config.distance)
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the index is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Distance under `metric`. Cosine distance is `1 - cos`, with zero vectors
/// treated as maximally distant.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
        DistanceMetric::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                1.0
            } else {
                1.0 - dot / (norm_a * norm_b)
            }
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> DocentResult<Vec<VectorHit>> {
        let entries = self.entries.read().await;

        let mut hits = Vec::new();
        for entry in entries.iter() {
            if filter.map(|f| !f.matches(&entry.chunk.metadata)).unwrap_or(false) {
                continue;
            }
            if entry.embedding.len() != embedding.len() {
                return Err(DocentError::validation(format!(
                    "Query has {} dimensions, index has {}",
                    embedding.len(),
                    entry.embedding.len()
                )));
            }
            hits.push(VectorHit {
                id: Some(entry.chunk.id.clone()),
                text: entry.chunk.text.clone(),
                metadata: entry.chunk.metadata.clone(),
                distance: distance(self.distance, embedding, &entry.embedding),
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> DocentResult<()> {
        if chunks.len() != embeddings.len() {
            return Err(DocentError::embedding_shape(chunks.len(), embeddings.len()));
        }

        let mut entries = self.entries.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let entry = Entry {
                chunk: chunk.clone(),
                embedding: embedding.clone(),
            };
            match entries.iter().position(|e| e.chunk.id == chunk.id) {
                Some(pos) => entries[pos] = entry,
                None => entries.push(entry),
            }
        }
        debug!(
            collection = %self.collection_name,
            upserted = chunks.len(),
            total = entries.len(),
            "Upserted chunks"
        );
        Ok(())
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

#[async_trait]
impl DocumentSource for InMemoryVectorIndex {
    async fn get_all_documents(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> DocentResult<Vec<DocumentChunk>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| filter.map(|f| f.matches(&e.chunk.metadata)).unwrap_or(true))
            .take(limit.unwrap_or(usize::MAX))
            .map(|e| e.chunk.clone())
            .collect())
    }
}
