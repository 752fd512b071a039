//! Retrieval pipeline.
//!
//! Provides hybrid retrieval with three modes:
//! - Dense: vector similarity with a relevance floor
//! - Lexical: BM25 over an in-memory term index
//! - Hybrid: max-normalized convex fusion of both
//!
//! Results can be reordered by an optional cross-encoder and are always
//! filtered by RBAC before they leave the engine.

mod engine;
mod fusion;
mod modes;
mod ranking;
mod recency;
mod rerank;
mod term_index;

pub use engine::{RetrievalEngine, RetrievalEngineBuilder};
pub use fusion::{dense_candidates, fuse, similarity_from_distance, HybridRetriever};
pub use modes::{RetrievalConfig, RetrievalMode};
pub use ranking::{rank_dense, rank_lexical};
pub use recency::{parse_timestamp, recency_boost, Clock, FixedClock, SystemClock};
pub use rerank::Reranker;
pub use term_index::{tokenize, TermIndex, BM25_B, BM25_EPSILON, BM25_K1};
