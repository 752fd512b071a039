//! docent-embeddings - Embedding provider implementations for docent.
//!
//! # Supported Providers
//!
//! - **Ollama** (feature: `ollama`) - local embedding models via Ollama
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small and friends
//!
//! # Example
//!
//! ```ignore
//! use docent_embeddings::EmbedderFactory;
//!
//! let embedder = EmbedderFactory::ollama_with_model("nomic-embed-text", 768)?;
//! let vector = embedder.embed_query("how do I reset my vpn token").await?;
//! ```

mod factory;
mod ollama;
mod openai;

pub use factory::EmbedderFactory;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

// Re-export core types for convenience
pub use docent_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
