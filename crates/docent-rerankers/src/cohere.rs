//! Cohere reranker implementation.

use async_trait::async_trait;

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{CrossEncoder, RerankerConfig};

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::batch::{collect, group_by_query, scatter};

const DEFAULT_COHERE_URL: &str = "https://api.cohere.ai/v1";

/// Cohere rerank API as a cross-encoder.
pub struct CohereCrossEncoder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CohereRerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [&'a str],
    top_n: usize,
    return_documents: bool,
}

#[derive(Debug, Deserialize)]
struct CohereRerankResponse {
    results: Vec<CohereRerankResult>,
}

#[derive(Debug, Deserialize)]
struct CohereRerankResult {
    index: usize,
    relevance_score: f32,
}

impl CohereCrossEncoder {
    /// Create a new Cohere client.
    pub fn new(config: RerankerConfig) -> DocentResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("COHERE_API_KEY").ok())
            .ok_or_else(|| {
                DocentError::Configuration(
                    "Cohere API key required. Set COHERE_API_KEY or provide api_key.".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COHERE_URL.to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint: format!("{}/rerank", base_url.trim_end_matches('/')),
            model: config.model,
        })
    }

    async fn rerank(&self, query: &str, documents: &[&str]) -> DocentResult<CohereRerankResponse> {
        let request = CohereRerankRequest {
            model: &self.model,
            query,
            documents,
            top_n: documents.len(),
            return_documents: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::reranker(format!("Failed to call Cohere API: {}", e)))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(DocentError::reranker(format!("Cohere API error: {}", error)));
        }

        response
            .json()
            .await
            .map_err(|e| DocentError::reranker(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl CrossEncoder for CohereCrossEncoder {
    async fn compute_score(&self, pairs: &[(String, String)]) -> DocentResult<Vec<f32>> {
        if pairs.is_empty() {
            return Ok(vec![]);
        }

        let mut scores = vec![None; pairs.len()];
        for group in group_by_query(pairs) {
            let response = self.rerank(group.query, &group.texts).await?;
            scatter(
                &group,
                response
                    .results
                    .into_iter()
                    .map(|r| (r.index, r.relevance_score)),
                &mut scores,
            )?;
        }
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
    fn test_requires_api_key() {
        let config = RerankerConfig {
            api_key: Some("co-test".to_string()),
            model: "rerank-english-v3.0".to_string(),
            ..Default::default()
        };
        let encoder = CohereCrossEncoder::new(config).unwrap();
        assert_eq!(encoder.endpoint, "https://api.cohere.ai/v1/rerank");
        assert_eq!(encoder.model_name(), "rerank-english-v3.0");
    }

    #[test]
    fn test_response_parsing() {
        let parsed: CohereRerankResponse = serde_json::from_str(
            r#"{"id":"x","results":[{"index":1,"relevance_score":0.8},{"index":0,"relevance_score":0.1}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].index, 1);
    }
}
