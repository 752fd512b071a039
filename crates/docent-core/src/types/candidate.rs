//! Scored candidate produced by the retrieval pipeline.

use serde::{Deserialize, Serialize};

use super::chunk::{synthetic_id, ChunkMetadata, DocumentChunk};

/// A raw hit returned by a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    /// Identifier, when the store returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Chunk text.
    pub text: String,
    /// Chunk metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,
    /// Raw distance: 0 = identical, larger = more dissimilar.
    pub distance: f32,
}

impl VectorHit {
    /// Resolve a usable id: the hit's own id, then an `id` metadata key,
    /// then the synthetic `source#prefix` id.
    pub fn resolved_id(&self) -> String {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.metadata.get_str("id").filter(|id| !id.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| synthetic_id(self.metadata.source.as_deref(), &self.text))
    }
}

/// A document chunk annotated with transient retrieval scores.
///
/// None of the score fields persist. Ordering uses [`ScoredCandidate::sort_key`]:
/// `rerank_score` once the reranker has run, `score` before that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Chunk id.
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// Chunk metadata.
    pub metadata: ChunkMetadata,
    /// Dense similarity plus recency boost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_score: Option<f64>,
    /// Raw BM25 score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bm25_score: Option<f64>,
    /// Score for the active retrieval mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Fused score (hybrid mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_score: Option<f64>,
    /// Cross-encoder score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f64>,
    /// Raw vector distance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl ScoredCandidate {
    /// Create an unscored candidate.
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
            dense_score: None,
            bm25_score: None,
            score: None,
            hybrid_score: None,
            rerank_score: None,
            distance: None,
        }
    }

    /// Create a candidate from a vector hit, resolving its id.
    pub fn from_hit(hit: VectorHit) -> Self {
        let id = hit.resolved_id();
        let mut candidate = Self::new(id, hit.text, hit.metadata);
        candidate.distance = Some(f64::from(hit.distance));
        candidate
    }

    /// The authoritative ordering key at the current pipeline stage.
    pub fn sort_key(&self) -> f64 {
        self.rerank_score.or(self.score).unwrap_or(0.0)
    }
}

impl From<DocumentChunk> for ScoredCandidate {
    fn from(chunk: DocumentChunk) -> Self {
        Self::new(chunk.id, chunk.text, chunk.metadata)
    }
}

/// Stable descending sort by [`ScoredCandidate::sort_key`].
pub fn sort_descending(candidates: &mut [ScoredCandidate]) {
    use ordered_float::OrderedFloat;
    candidates.sort_by(|a, b| OrderedFloat(b.sort_key()).cmp(&OrderedFloat(a.sort_key())));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: Option<&str>, source: &str, text: &str) -> VectorHit {
        VectorHit {
            id: id.map(str::to_string),
            text: text.to_string(),
            metadata: ChunkMetadata::default().with_source(source),
            distance: 0.5,
        }
    }

    #[test]
    fn test_resolved_id_prefers_hit_id() {
        assert_eq!(hit(Some("abc"), "s", "t").resolved_id(), "abc");
    }

    #[test]
    fn test_resolved_id_falls_back_to_metadata_then_synthetic() {
        let mut h = hit(None, "kb.md", "some text");
        assert_eq!(h.resolved_id(), "kb.md#some text");

        h.metadata
            .extra
            .insert("id".to_string(), serde_json::json!("meta-id"));
        assert_eq!(h.resolved_id(), "meta-id");

        h.id = Some(String::new());
        assert_eq!(h.resolved_id(), "meta-id");
    }

    #[test]
    fn test_sort_key_prefers_rerank_score() {
        let mut c = ScoredCandidate::new("a", "t", ChunkMetadata::default());
        assert_eq!(c.sort_key(), 0.0);
        c.score = Some(0.4);
        assert_eq!(c.sort_key(), 0.4);
        c.rerank_score = Some(-2.0);
        assert_eq!(c.sort_key(), -2.0);
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let mut list: Vec<ScoredCandidate> = ["a", "b", "c", "d"]
            .iter()
            .zip([0.5, 0.9, 0.5, 0.1])
            .map(|(id, s)| {
                let mut c = ScoredCandidate::new(*id, "", ChunkMetadata::default());
                c.score = Some(s);
                c
            })
            .collect();
        sort_descending(&mut list);
        let ids: Vec<_> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }
}
