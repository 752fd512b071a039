//! Factory for creating embedding providers.

use std::sync::Arc;

use tracing::info;

use docent_core::error::DocentResult;
use docent_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};

use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAIEmbedder;

/// Factory for creating embedding providers.
pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Create an embedder from the given configuration.
    pub fn create(config: EmbedderConfig) -> DocentResult<Arc<dyn Embedder>> {
        let provider = config.provider;
        let embedder: Arc<dyn Embedder> = match provider {
            EmbedderProvider::Ollama => Arc::new(OllamaEmbedder::new(config)?),
            EmbedderProvider::OpenAI => Arc::new(OpenAIEmbedder::new(config)?),
        };
        info!(provider = %provider, model = embedder.model_name(), "Embedder ready");
        Ok(embedder)
    }

    /// Create an Ollama embedder with default configuration.
    pub fn ollama() -> DocentResult<Arc<dyn Embedder>> {
        Self::create(EmbedderConfig::default())
    }

    /// Create an Ollama embedder with a specific model.
    pub fn ollama_with_model(model: impl Into<String>, dims: usize) -> DocentResult<Arc<dyn Embedder>> {
        Self::create(EmbedderConfig {
            provider: EmbedderProvider::Ollama,
            model: model.into(),
            embedding_dims: dims,
            ..Default::default()
        })
    }

    /// Create an OpenAI embedder with a specific model.
    pub fn openai_with_model(model: impl Into<String>, dims: usize) -> DocentResult<Arc<dyn Embedder>> {
        Self::create(EmbedderConfig {
            provider: EmbedderProvider::OpenAI,
            model: model.into(),
            embedding_dims: dims,
            ..Default::default()
        })
    }
}
