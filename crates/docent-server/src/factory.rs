//! Wiring collaborators and the retrieval engine from configuration.

use std::sync::Arc;

use docent_core::config::DocentConfig;
use docent_core::error::DocentResult;
use docent_core::retrieval::{RetrievalConfig, RetrievalEngine, RetrievalEngineBuilder};
use docent_core::traits::{CrossEncoder, Embedder};

use docent_embeddings::EmbedderFactory;
use docent_rerankers::RerankerFactory;
use docent_vector_stores::{VectorStoreFactory, VectorStoreHandle};

/// External collaborators shared by retrieval and ingestion.
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn Embedder>,
    pub store: VectorStoreHandle,
    pub cross_encoder: Option<Arc<dyn CrossEncoder>>,
}

impl Services {
    /// Create services from explicit collaborators.
    pub fn new(embedder: Arc<dyn Embedder>, store: VectorStoreHandle) -> Self {
        Self {
            embedder,
            store,
            cross_encoder: None,
        }
    }

    /// Attach a cross-encoder.
    pub fn with_cross_encoder(mut self, encoder: Arc<dyn CrossEncoder>) -> Self {
        self.cross_encoder = Some(encoder);
        self
    }

    /// Build every collaborator named by `config`.
    ///
    /// An unusable reranker is logged and skipped. Embedder and vector store
    /// failures are returned.
    pub async fn from_config(config: &DocentConfig) -> DocentResult<Self> {
        let embedder = EmbedderFactory::create(config.embedder.clone())?;
        let store = VectorStoreFactory::create(config.vector_store.clone()).await?;
        let cross_encoder = if config.reranker.enabled {
            RerankerFactory::try_create(config.reranker.config.clone())
        } else {
            None
        };

        Ok(Self {
            embedder,
            store,
            cross_encoder,
        })
    }
}

/// Build a retrieval engine over the current contents of the vector store.
pub async fn build_engine(
    config: &RetrievalConfig,
    services: &Services,
) -> DocentResult<RetrievalEngine> {
    let mut builder = RetrievalEngineBuilder::new(
        config.clone(),
        services.embedder.clone(),
        services.store.index.clone(),
    )
    .with_document_source(services.store.source.clone());

    if let Some(encoder) = &services.cross_encoder {
        builder = builder.with_cross_encoder(encoder.clone());
    }

    builder.build().await
}
