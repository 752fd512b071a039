//! docent-core - Retrieval core for docent.
//!
//! This crate provides the types, collaborator traits, and hybrid retrieval
//! pipeline (BM25, dense search, fusion, reranking, RBAC) for an internal
//! knowledge assistant, plus ingestion normalization and per-user memory.
//!
//! # Example
//!
//! ```ignore
//! use docent_core::{AccessContext, RetrievalConfig, RetrievalEngineBuilder};
//!
//! let engine = RetrievalEngineBuilder::new(RetrievalConfig::hybrid(5), embedder, index.clone())
//!     .with_document_source(index)
//!     .build()
//!     .await?;
//!
//! let results = engine.retrieve("how do I reset the vpn", &AccessContext::employee("u42")).await?;
//! ```

pub mod config;
pub mod error;
pub mod ingestion;
pub mod memory;
pub mod rbac;
pub mod retrieval;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ChunkingConfig, DocentConfig, MemoryConfig, RerankerSettings, RetrievalSettings};
pub use error::{DocentError, DocentResult, ErrorCode};
pub use ingestion::{Chunker, IngestReport, IngestStatus, IngestionPipeline, RawRecord};
pub use memory::{ConversationStore, ConversationTurn, FeedbackRecord, FeedbackStore, MemorySnapshot};
pub use rbac::{AccessContext, RbacFilter, Role};
pub use retrieval::{RetrievalConfig, RetrievalEngine, RetrievalEngineBuilder, RetrievalMode};
pub use traits::{
    CrossEncoder, DocumentSource, Embedder, EmbedderConfig, RerankerConfig, VectorIndex,
    VectorStoreConfig,
};
pub use types::{ChunkMetadata, DocumentChunk, MetadataFilter, ScoredCandidate, VectorHit, Visibility};
