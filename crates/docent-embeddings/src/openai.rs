//! OpenAI embedding provider implementation.

use async_trait::async_trait;

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: EmbedderConfig) -> DocentResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DocentError::Configuration(
                    "OpenAI API key not found. Set OPENAI_API_KEY or provide api_key in config."
                        .to_string(),
                )
            })?;

        #[cfg(feature = "openai")]
        let client = {
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(ref base_url) = config.base_url {
                openai_config = openai_config.with_api_base(base_url);
            }
            Client::with_config(openai_config)
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    #[cfg(feature = "openai")]
    async fn create(&self, input: EmbeddingInput) -> DocentResult<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input,
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| DocentError::embedding(format!("OpenAI embedding error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed_query(&self, text: &str) -> DocentResult<Vec<f32>> {
        self.create(EmbeddingInput::String(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocentError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "openai"))]
    async fn embed_query(&self, _text: &str) -> DocentResult<Vec<f32>> {
        Err(DocentError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_texts(&self, texts: &[String]) -> DocentResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.create(EmbeddingInput::StringArray(texts.to_vec())).await?;
        docent_core::traits::check_batch_shape(texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_is_accepted() {
        let config = EmbedderConfig {
            model: "text-embedding-3-small".to_string(),
            embedding_dims: 1536,
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let embedder = OpenAIEmbedder::new(config).unwrap();
        assert_eq!(embedder.dimension(), 1536);
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }
}
