//! Factory for creating cross-encoder clients.

use std::sync::Arc;

use tracing::{info, warn};

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{CrossEncoder, RerankerConfig, RerankerProvider};

/// Factory for creating cross-encoder clients.
pub struct RerankerFactory;

impl RerankerFactory {
    /// Create a cross-encoder from the given configuration.
    pub fn create(config: RerankerConfig) -> DocentResult<Arc<dyn CrossEncoder>> {
        match config.provider {
            #[cfg(feature = "tei")]
            RerankerProvider::Tei => Ok(Arc::new(crate::tei::TeiCrossEncoder::new(config)?)),

            #[cfg(feature = "cohere")]
            RerankerProvider::Cohere => Ok(Arc::new(crate::cohere::CohereCrossEncoder::new(config)?)),

            #[allow(unreachable_patterns)]
            provider => Err(DocentError::UnsupportedProvider {
                provider: format!("{} (feature not enabled)", provider),
            }),
        }
    }

    /// Create a cross-encoder, or `None` with a warning if it cannot be
    /// built. Retrieval then runs without reranking.
    pub fn try_create(config: RerankerConfig) -> Option<Arc<dyn CrossEncoder>> {
        let provider = config.provider;
        match Self::create(config) {
            Ok(encoder) => {
                info!(provider = %provider, model = encoder.model_name(), "Reranker enabled");
                Some(encoder)
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Reranker unavailable; continuing without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_create_tei() {
        let encoder = RerankerFactory::try_create(RerankerConfig::default());
        assert_eq!(
            encoder.map(|e| e.model_name().to_string()).as_deref(),
            Some("BAAI/bge-reranker-base")
        );
    }

    #[test]
    fn test_try_create_degrades_on_bad_config() {
        let config = RerankerConfig {
            base_url: Some("not-a-url".to_string()),
            ..Default::default()
        };
        assert!(RerankerFactory::try_create(config).is_none());
    }
}
