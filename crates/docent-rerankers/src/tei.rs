//! Cross-encoder served by text-embeddings-inference.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{CrossEncoder, RerankerConfig};

use crate::batch::{collect, group_by_query, scatter};

const DEFAULT_TEI_URL: &str = "http://localhost:8080";

#[derive(Debug, Serialize)]
struct TeiRerankRequest<'a> {
    query: &'a str,
    texts: &'a [&'a str],
    raw_scores: bool,
}

#[derive(Debug, Deserialize)]
struct TeiRerankResult {
    index: usize,
    score: f32,
}

/// Cross-encoder backed by a TEI `/rerank` endpoint.
pub struct TeiCrossEncoder {
    client: Client,
    endpoint: String,
    model: String,
}

impl TeiCrossEncoder {
    /// Create a new TEI client. The model name is informational; TEI
    /// serves whichever model it was started with.
    pub fn new(config: RerankerConfig) -> DocentResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TEI_URL.to_string());
        let base = url::Url::parse(&base_url)
            .map_err(|e| DocentError::Configuration(format!("Invalid reranker URL: {}", e)))?;
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(DocentError::Configuration(format!(
                "Invalid reranker URL: {}",
                base_url
            )));
        }

        Ok(Self {
            client: Client::new(),
            endpoint: format!("{}/rerank", base.as_str().trim_end_matches('/')),
            model: config.model,
        })
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn rerank(&self, query: &str, texts: &[&str]) -> DocentResult<Vec<TeiRerankResult>> {
        let request = TeiRerankRequest {
            query,
            texts,
            raw_scores: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::reranker(format!("Failed to call reranker: {}", e)))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(DocentError::reranker(format!("Reranker error: {}", error)));
        }

        response
            .json()
            .await
            .map_err(|e| DocentError::reranker(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl CrossEncoder for TeiCrossEncoder {
    async fn compute_score(&self, pairs: &[(String, String)]) -> DocentResult<Vec<f32>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores = vec![None; pairs.len()];
        for group in group_by_query(pairs) {
            let results = self.rerank(group.query, &group.texts).await?;
            scatter(&group, results.into_iter().map(|r| (r.index, r.score)), &mut scores)?;
        }
        debug!(pairs = pairs.len(), model = %self.model, "Scored pairs");
        collect(scores)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let encoder = TeiCrossEncoder::new(RerankerConfig::default()).unwrap();
        assert_eq!(encoder.endpoint(), "http://localhost:8080/rerank");
        assert_eq!(encoder.model_name(), "BAAI/bge-reranker-base");

        let config = RerankerConfig {
            base_url: Some("https://rerank.internal/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            TeiCrossEncoder::new(config).unwrap().endpoint(),
            "https://rerank.internal/rerank"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        for bad in ["localhost:8080", "httpx://tei:8080", "http//tei:8080", "https://"] {
            let config = RerankerConfig {
                base_url: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(TeiCrossEncoder::new(config), Err(DocentError::Configuration(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_request_shape() {
        let texts = ["a", "b"];
        let body = serde_json::to_value(TeiRerankRequest {
            query: "vpn",
            texts: &texts,
            raw_scores: false,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "query": "vpn", "texts": ["a", "b"], "raw_scores": false })
        );
    }

    #[tokio::test]
    async fn test_empty_pairs_skip_request() {
        let config = RerankerConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let encoder = TeiCrossEncoder::new(config).unwrap();
        assert!(encoder.compute_score(&[]).await.unwrap().is_empty());
    }
}
