//! Single-family relevance ranking.
//!
//! The dense path enforces the relevance floor; the lexical path does not,
//! because raw BM25 scores are unbounded and a fixed floor would be
//! meaningless across corpora.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{sort_descending, ScoredCandidate, VectorHit};

use super::fusion::dense_candidates;
use super::recency::recency_boost;

/// Rank dense hits: `score = 1/(1+distance) + recency`, drop scores below
/// `min_relevance`, sort descending, keep `top_k`.
pub fn rank_dense(
    hits: Vec<VectorHit>,
    now: DateTime<Utc>,
    min_relevance: f64,
    top_k: usize,
) -> Vec<ScoredCandidate> {
    let mut candidates = dense_candidates(hits, now);
    let fetched = candidates.len();
    for candidate in &mut candidates {
        candidate.score = candidate.dense_score;
    }
    candidates.retain(|c| c.score.unwrap_or(0.0) >= min_relevance);
    sort_descending(&mut candidates);
    candidates.truncate(top_k);
    debug!(fetched, kept = candidates.len(), "Ranked dense candidates");
    candidates
}

/// Rank lexical candidates: `score = bm25_score + recency`, sort descending,
/// keep `top_k`. No relevance floor.
pub fn rank_lexical(
    mut candidates: Vec<ScoredCandidate>,
    now: DateTime<Utc>,
    top_k: usize,
) -> Vec<ScoredCandidate> {
    for candidate in &mut candidates {
        let bm25 = candidate.bm25_score.unwrap_or(0.0);
        candidate.score = Some(bm25 + recency_boost(&candidate.metadata, now));
    }
    sort_descending(&mut candidates);
    candidates.truncate(top_k);
    debug!(kept = candidates.len(), "Ranked lexical candidates");
    candidates
}
