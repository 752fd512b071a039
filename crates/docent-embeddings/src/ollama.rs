//! Ollama embedding provider implementation.

use async_trait::async_trait;
use tracing::debug;

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "ollama")]
use docent_core::traits::check_batch_shape;
#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
    Ollama,
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Ollama embedding provider.
pub struct OllamaEmbedder {
    #[cfg(feature = "ollama")]
    client: Ollama,
    host: String,
    port: u16,
    config: EmbedderConfig,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(config: EmbedderConfig) -> DocentResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let (host, port) = resolve_host(&base_url)?;

        #[cfg(feature = "ollama")]
        let client = Ollama::new(host.clone(), port);

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            host,
            port,
            config,
        })
    }

    /// Scheme and host requests are sent to, e.g. `http://localhost`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port requests are sent to.
    pub fn port(&self) -> u16 {
        self.port
    }

    #[cfg(feature = "ollama")]
    async fn embed_batch(&self, texts: &[String]) -> DocentResult<Vec<Vec<f32>>> {
        let request = GenerateEmbeddingsRequest::new(
            self.config.model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| DocentError::embedding(format!("Ollama embedding error: {}", e)))?;

        check_batch_shape(texts.len(), &response.embeddings)?;
        debug!(count = texts.len(), model = %self.config.model, "Embedded texts");
        Ok(response.embeddings)
    }

    #[cfg(not(feature = "ollama"))]
    async fn embed_batch(&self, texts: &[String]) -> DocentResult<Vec<Vec<f32>>> {
        debug!(count = texts.len(), "Ollama support not compiled in");
        Err(DocentError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }
}

/// Split a base URL into the `scheme://host` and port the client expects.
fn resolve_host(base_url: &str) -> DocentResult<(String, u16)> {
    let url = url::Url::parse(base_url)
        .map_err(|e| DocentError::Configuration(format!("Invalid Ollama URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DocentError::Configuration(format!(
            "Invalid Ollama URL scheme: {}",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| DocentError::Configuration(format!("Ollama URL has no host: {}", base_url)))?;
    let port = url.port().unwrap_or(DEFAULT_OLLAMA_PORT);
    Ok((format!("{}://{}", url.scheme(), host), port))
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_query(&self, text: &str) -> DocentResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DocentError::embedding("No embedding returned"))
    }

    async fn embed_texts(&self, texts: &[String]) -> DocentResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
