//! docent-rerankers - Cross-encoder clients for docent.
//!
//! Each client implements [`CrossEncoder`]: it scores `(query, passage)`
//! pairs and returns one score per pair in input order.
//!
//! # Supported Backends
//!
//! - **TEI** (feature: `tei`) - text-embeddings-inference `/rerank`, serving
//!   models such as `BAAI/bge-reranker-base`
//! - **Cohere** (feature: `cohere`) - Cohere Rerank API

mod batch;
mod factory;

#[cfg(feature = "cohere")]
mod cohere;

#[cfg(feature = "tei")]
mod tei;

pub use factory::RerankerFactory;

#[cfg(feature = "cohere")]
pub use cohere::CohereCrossEncoder;

#[cfg(feature = "tei")]
pub use tei::TeiCrossEncoder;

// Re-export core types
pub use docent_core::traits::{CrossEncoder, RerankerConfig, RerankerProvider};
