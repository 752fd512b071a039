//! Hybrid score fusion.
//!
//! Dense and lexical candidates are merged by id, each score family is
//! divided by its maximum over the merged set, and the two normalized scores
//! are combined as `w * dense + (1 - w) * bm25`. Max-normalization keeps the
//! fused score in `[0, 1]` regardless of the raw BM25 scale.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::DocentResult;
use crate::traits::VectorIndex;
use crate::types::{sort_descending, ScoredCandidate, VectorHit};

use super::modes::RetrievalConfig;
use super::recency::{recency_boost, Clock};
use super::term_index::TermIndex;

/// Map a raw distance to a similarity in `(0, 1]`. Negative distances are
/// treated as zero.
pub fn similarity_from_distance(distance: f64) -> f64 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Turn vector hits into candidates with `dense_score = similarity + recency`.
pub fn dense_candidates(hits: Vec<VectorHit>, now: DateTime<Utc>) -> Vec<ScoredCandidate> {
    hits.into_iter()
        .map(|hit| {
            let mut candidate = ScoredCandidate::from_hit(hit);
            let similarity = similarity_from_distance(candidate.distance.unwrap_or(1.0));
            candidate.dense_score = Some(similarity + recency_boost(&candidate.metadata, now));
            candidate
        })
        .collect()
}

/// Merge dense and lexical candidates and compute fused scores.
///
/// `dense` must carry `dense_score`; `lexical` must carry `bm25_score`.
/// Dense candidates come first in merge order, which is also the tie order.
/// Returns at most `config.top_k` candidates with `score >= min_relevance`,
/// sorted descending, each with both family scores populated.
pub fn fuse(
    dense: Vec<ScoredCandidate>,
    lexical: Vec<ScoredCandidate>,
    config: &RetrievalConfig,
) -> Vec<ScoredCandidate> {
    let mut merged: Vec<ScoredCandidate> = Vec::with_capacity(dense.len() + lexical.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for candidate in dense {
        match positions.get(&candidate.id) {
            // Later duplicates replace the payload but keep the first position.
            Some(&pos) => merged[pos] = candidate,
            None => {
                positions.insert(candidate.id.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    for candidate in lexical {
        match positions.get(&candidate.id) {
            Some(&pos) => merged[pos].bm25_score = candidate.bm25_score,
            None => {
                positions.insert(candidate.id.clone(), merged.len());
                let mut candidate = candidate;
                candidate.dense_score = Some(0.0);
                merged.push(candidate);
            }
        }
    }

    if merged.is_empty() {
        return merged;
    }

    for candidate in &mut merged {
        candidate.dense_score.get_or_insert(0.0);
        candidate.bm25_score.get_or_insert(0.0);
    }

    let max_dense = family_max(&merged, |c| c.dense_score);
    let max_bm25 = family_max(&merged, |c| c.bm25_score);
    let w = config.dense_weight;

    for candidate in &mut merged {
        let dense_norm = normalize(candidate.dense_score, max_dense);
        let bm25_norm = normalize(candidate.bm25_score, max_bm25);
        let hybrid = w * dense_norm + (1.0 - w) * bm25_norm;
        candidate.hybrid_score = Some(hybrid);
        candidate.score = Some(hybrid);
    }

    let before = merged.len();
    merged.retain(|c| c.score.unwrap_or(0.0) >= config.min_relevance);
    sort_descending(&mut merged);
    merged.truncate(config.top_k);

    debug!(
        merged = before,
        kept = merged.len(),
        max_dense,
        max_bm25,
        "Fused hybrid candidates"
    );
    merged
}

fn family_max(candidates: &[ScoredCandidate], get: impl Fn(&ScoredCandidate) -> Option<f64>) -> f64 {
    candidates
        .iter()
        .map(|c| get(c).unwrap_or(0.0))
        .fold(0.0f64, f64::max)
}

fn normalize(value: Option<f64>, max: f64) -> f64 {
    if max > 0.0 {
        (value.unwrap_or(0.0) / max).max(0.0)
    } else {
        0.0
    }
}

/// Dense + BM25 retriever over a fixed term index snapshot.
pub struct HybridRetriever {
    vector_index: Arc<dyn VectorIndex>,
    term_index: Arc<TermIndex>,
    clock: Arc<dyn Clock>,
}

impl HybridRetriever {
    /// Create a hybrid retriever.
    pub fn new(
        vector_index: Arc<dyn VectorIndex>,
        term_index: Arc<TermIndex>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vector_index,
            term_index,
            clock,
        }
    }

    /// The term index this retriever searches.
    pub fn term_index(&self) -> &TermIndex {
        &self.term_index
    }

    /// Retrieve fused candidates for a query whose embedding is already known.
    ///
    /// An empty term index yields `[]` with a warning rather than silently
    /// degrading to dense-only results.
    pub async fn retrieve(
        &self,
        query: &str,
        embedding: &[f32],
        config: &RetrievalConfig,
    ) -> DocentResult<Vec<ScoredCandidate>> {
        if self.term_index.is_empty() {
            warn!("Term index is empty; hybrid retrieval returns no results");
            return Ok(Vec::new());
        }

        let hits = self
            .vector_index
            .similarity_search(embedding, config.dense_k(), None)
            .await?;
        let dense = dense_candidates(hits, self.clock.now());
        let lexical = self.term_index.search(query, config.lexical_k());

        debug!(
            dense = dense.len(),
            lexical = lexical.len(),
            "Collected hybrid candidates"
        );
        Ok(fuse(dense, lexical, config))
    }
}
