//! Factory for creating vector index backends.

use std::sync::Arc;

use docent_core::error::DocentResult;
use docent_core::traits::{DocumentSource, VectorIndex, VectorStoreConfig, VectorStoreProvider};

use crate::memory::InMemoryVectorIndex;

/// A backend viewed through both of its roles.
#[derive(Clone)]
pub struct VectorStoreHandle {
    /// Nearest-neighbour search and upsert.
    pub index: Arc<dyn VectorIndex>,
    /// Snapshot reader for the term index.
    pub source: Arc<dyn DocumentSource>,
}

impl VectorStoreHandle {
    /// Wrap a backend implementing both traits.
    pub fn new<T>(store: Arc<T>) -> Self
    where
        T: VectorIndex + DocumentSource + 'static,
    {
        Self {
            index: store.clone(),
            source: store,
        }
    }
}

/// Factory for creating vector index backends.
pub struct VectorStoreFactory;

impl VectorStoreFactory {
    /// Create a backend from the given configuration.
    pub async fn create(config: VectorStoreConfig) -> DocentResult<VectorStoreHandle> {
        match config.provider {
            VectorStoreProvider::InMemory => Ok(Self::in_memory(&config)),

            #[cfg(feature = "chroma")]
            VectorStoreProvider::Chroma => {
                let store = crate::chroma::ChromaVectorIndex::new(config).await?;
                Ok(VectorStoreHandle::new(Arc::new(store)))
            }

            #[allow(unreachable_patterns)]
            provider => Err(docent_core::error::DocentError::UnsupportedProvider {
                provider: format!("{} (feature not enabled)", provider),
            }),
        }
    }

    /// Create an in-memory backend.
    pub fn in_memory(config: &VectorStoreConfig) -> VectorStoreHandle {
        VectorStoreHandle::new(Arc::new(InMemoryVectorIndex::from_config(config)))
    }
}
