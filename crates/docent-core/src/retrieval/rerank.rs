//! Cross-encoder reranking stage.
//!
//! Reranking is best-effort: any scoring failure is logged and the input
//! order is returned untouched. A NaN or infinite score counts as a failure.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::traits::CrossEncoder;
use crate::types::{sort_descending, ScoredCandidate};

/// Reorders candidates by cross-encoder score.
#[derive(Clone)]
pub struct Reranker {
    encoder: Arc<dyn CrossEncoder>,
}

impl Reranker {
    /// Wrap a cross-encoder.
    pub fn new(encoder: Arc<dyn CrossEncoder>) -> Self {
        Self { encoder }
    }

    /// Get the model name.
    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    /// Score `(query, text)` pairs, set `rerank_score` and sort descending.
    pub async fn rerank(&self, query: &str, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let pairs: Vec<(String, String)> = candidates
            .iter()
            .map(|c| (query.to_string(), c.text.clone()))
            .collect();

        let scores = match self.encoder.compute_score(&pairs).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, "Reranking failed; keeping pre-rerank order");
                return candidates;
            }
        };

        if scores.len() != candidates.len() {
            warn!(
                expected = candidates.len(),
                actual = scores.len(),
                "Reranker returned the wrong number of scores; keeping pre-rerank order"
            );
            return candidates;
        }

        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            warn!(
                position = bad,
                "Reranker returned a non-finite score; keeping pre-rerank order"
            );
            return candidates;
        }

        let mut reranked = candidates;
        for (candidate, score) in reranked.iter_mut().zip(scores) {
            candidate.rerank_score = Some(f64::from(score));
        }
        sort_descending(&mut reranked);
        debug!(count = reranked.len(), "Reranked candidates");
        reranked
    }
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker").finish_non_exhaustive()
    }
}
