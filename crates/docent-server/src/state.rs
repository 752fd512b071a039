//! Server state management.

use std::sync::Arc;

use docent_core::config::DocentConfig;
use docent_core::error::DocentResult;
use docent_core::ingestion::{Chunker, IngestionPipeline};
use docent_core::memory::{ConversationStore, FeedbackStore};
use docent_core::retrieval::RetrievalEngine;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::info;

use crate::factory::{build_engine, Services};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DocentConfig,
    services: Services,
    engine: RwLock<Arc<RetrievalEngine>>,
    pipeline: IngestionPipeline,
    conversations: ConversationStore,
    feedback: FeedbackStore,
    ingest_lock: Mutex<()>,
}

impl AppState {
    /// Build the engine over the current store contents and wrap everything
    /// up for the router.
    pub async fn new(
        config: DocentConfig,
        services: Services,
        conversations: ConversationStore,
        feedback: FeedbackStore,
    ) -> DocentResult<Self> {
        let engine = build_engine(&config.retrieval.engine, &services).await?;
        let pipeline = IngestionPipeline::new(services.embedder.clone(), services.store.index.clone())
            .with_chunker(Chunker::from_config(&config.chunking));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                engine: RwLock::new(Arc::new(engine)),
                pipeline,
                conversations,
                feedback,
                ingest_lock: Mutex::new(()),
            }),
        })
    }

    /// Create state from configuration alone.
    pub async fn from_config(config: DocentConfig) -> DocentResult<Self> {
        let services = Services::from_config(&config).await?;
        let conversations = ConversationStore::from_config(&config.memory)?;
        let feedback = FeedbackStore::from_config(&config.memory)?;
        Self::new(config, services, conversations, feedback).await
    }

    /// The engine serving requests right now.
    ///
    /// Callers keep their snapshot for the whole request, so a concurrent
    /// rebuild never changes results mid-query.
    pub async fn engine(&self) -> Arc<RetrievalEngine> {
        self.inner.engine.read().await.clone()
    }

    /// Rebuild the engine from the vector store and swap it in.
    /// The previous engine stays in place if the build fails.
    pub async fn rebuild_engine(&self) -> DocentResult<Arc<RetrievalEngine>> {
        let engine = Arc::new(build_engine(&self.inner.config.retrieval.engine, &self.inner.services).await?);
        *self.inner.engine.write().await = engine.clone();
        info!(
            mode = %engine.effective_mode(),
            indexed = engine.indexed_documents().unwrap_or(0),
            "Retrieval engine rebuilt"
        );
        Ok(engine)
    }

    /// Serialize ingest-and-rebuild cycles.
    pub async fn lock_ingest(&self) -> MutexGuard<'_, ()> {
        self.inner.ingest_lock.lock().await
    }

    pub fn config(&self) -> &DocentConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &IngestionPipeline {
        &self.inner.pipeline
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.inner.conversations
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.inner.feedback
    }
}
