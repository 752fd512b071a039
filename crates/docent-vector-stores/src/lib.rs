//! docent-vector-stores - Vector index implementations for docent.
//!
//! Every backend implements both [`VectorIndex`] (nearest-neighbour search
//! and upsert) and [`DocumentSource`] (full snapshot for the term index).
//!
//! # Supported Backends
//!
//! - **In-memory** - brute-force scan, always available
//! - **Chroma** (feature: `chroma`) - Chroma REST API

mod factory;
mod memory;

#[cfg(feature = "chroma")]
mod chroma;

// Public exports
pub use factory::{VectorStoreFactory, VectorStoreHandle};
pub use memory::{distance, InMemoryVectorIndex};

#[cfg(feature = "chroma")]
pub use chroma::ChromaVectorIndex;

// Re-export core types for convenience
pub use docent_core::traits::{
    DistanceMetric, DocumentSource, VectorIndex, VectorStoreConfig, VectorStoreProvider,
};
