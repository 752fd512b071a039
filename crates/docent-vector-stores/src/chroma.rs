//! Chroma vector store implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use docent_core::error::{DocentError, DocentResult};
use docent_core::traits::{DistanceMetric, DocumentSource, VectorIndex, VectorStoreConfig};
use docent_core::types::{ChunkMetadata, DocumentChunk, FilterOperator, MetadataFilter, VectorHit};

use reqwest::Client;

const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";

/// Chroma vector store implementation.
pub struct ChromaVectorIndex {
    client: Client,
    base_url: String,
    collection_name: String,
    collection_id: String,
}

#[derive(Debug, Deserialize)]
struct ChromaCollection {
    id: String,
}

impl ChromaVectorIndex {
    /// Connect to Chroma and get or create the configured collection.
    ///
    /// `config.config` may carry `tenant` and `database`.
    pub async fn new(config: VectorStoreConfig) -> DocentResult<Self> {
        let base_url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_CHROMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let tenant = config
            .config
            .get("tenant")
            .and_then(Value::as_str)
            .unwrap_or("default_tenant");
        let database = config
            .config
            .get("database")
            .and_then(Value::as_str)
            .unwrap_or("default_database");

        let client = Client::new();
        let url = format!(
            "{}/api/v1/collections?tenant={}&database={}",
            base_url, tenant, database
        );
        let body = json!({
            "name": config.collection_name,
            "get_or_create": true,
            "metadata": { "hnsw:space": distance_to_chroma(config.distance) }
        });

        let response = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocentError::vector_store(format!("Failed to reach Chroma: {}", e)))?;
        let collection: ChromaCollection = parse_json(response, "get or create collection").await?;

        info!(
            collection = %config.collection_name,
            id = %collection.id,
            url = %base_url,
            "Connected to Chroma"
        );

        Ok(Self {
            client,
            base_url,
            collection_name: config.collection_name,
            collection_id: collection.id,
        })
    }

    fn collection_url(&self, op: &str) -> String {
        format!("{}/api/v1/collections/{}/{}", self.base_url, self.collection_id, op)
    }

    async fn post(&self, op: &str, body: Value) -> DocentResult<Value> {
        let response = self
            .client
            .post(self.collection_url(op))
            .json(&body)
            .send()
            .await
            .map_err(|e| DocentError::vector_store(format!("Failed to {}: {}", op, e)))?;
        parse_json(response, op).await
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    op: &str,
) -> DocentResult<T> {
    if !response.status().is_success() {
        let status = response.status();
        let error = response.text().await.unwrap_or_default();
        return Err(DocentError::vector_store(format!(
            "Failed to {} ({}): {}",
            op, status, error
        )));
    }
    response
        .json()
        .await
        .map_err(|e| DocentError::vector_store(format!("Failed to parse {} response: {}", op, e)))
}

fn distance_to_chroma(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::Cosine => "cosine",
        DistanceMetric::Euclidean => "l2",
    }
}

/// Translate a metadata filter into a Chroma `where` clause.
pub(crate) fn build_where(filter: &MetadataFilter) -> Option<Value> {
    let mut conditions: Vec<Value> = filter
        .conditions
        .iter()
        .map(|cond| {
            let (op, value) = match &cond.operator {
                FilterOperator::Eq(v) => ("$eq", v.clone()),
                FilterOperator::Ne(v) => ("$ne", v.clone()),
                FilterOperator::In(vs) => ("$in", Value::Array(vs.clone())),
                FilterOperator::Nin(vs) => ("$nin", Value::Array(vs.clone())),
            };
            json!({ cond.field.clone(): { op: value } })
        })
        .collect();

    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(json!({ "$and": conditions })),
    }
}

/// Chroma only stores scalar metadata values; nested values are stored as
/// their JSON text.
pub(crate) fn to_chroma_metadata(metadata: &ChunkMetadata) -> DocentResult<Map<String, Value>> {
    let Value::Object(map) = serde_json::to_value(metadata)? else {
        return Ok(Map::new());
    };
    Ok(map
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| match v {
            Value::Array(_) | Value::Object(_) => (k, Value::String(v.to_string())),
            scalar => (k, scalar),
        })
        .collect())
}

fn from_chroma_metadata(value: &Value) -> ChunkMetadata {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Parse a `query` response for a single query embedding.
pub(crate) fn parse_query_response(result: &Value) -> Vec<VectorHit> {
    let column = |key: &str| result[key][0].as_array().cloned().unwrap_or_default();
    let ids = column("ids");
    let documents = column("documents");
    let metadatas = column("metadatas");
    let distances = column("distances");

    ids.iter()
        .enumerate()
        .map(|(i, id)| VectorHit {
            id: id.as_str().map(str::to_string),
            text: documents
                .get(i)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            metadata: metadatas.get(i).map(from_chroma_metadata).unwrap_or_default(),
            distance: distances.get(i).and_then(Value::as_f64).unwrap_or(1.0) as f32,
        })
        .collect()
}

/// Parse a `get` response.
pub(crate) fn parse_get_response(result: &Value) -> Vec<DocumentChunk> {
    let column = |key: &str| result[key].as_array().cloned().unwrap_or_default();
    let ids = column("ids");
    let documents = column("documents");
    let metadatas = column("metadatas");

    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            DocumentChunk::new(
                id.as_str().unwrap_or_default(),
                documents
                    .get(i)
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
                metadatas.get(i).map(from_chroma_metadata).unwrap_or_default(),
            )
        })
        .collect()
}

#[async_trait]
impl VectorIndex for ChromaVectorIndex {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> DocentResult<Vec<VectorHit>> {
        let mut body = json!({
            "query_embeddings": [embedding],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"]
        });
        if let Some(clause) = filter.and_then(build_where) {
            body["where"] = clause;
        }

        let result = self.post("query", body).await?;
        let hits = parse_query_response(&result);
        debug!(collection = %self.collection_name, hits = hits.len(), "Chroma query");
        Ok(hits)
    }

    async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> DocentResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        if chunks.len() != embeddings.len() {
            return Err(DocentError::embedding_shape(chunks.len(), embeddings.len()));
        }

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        let documents: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let metadatas = chunks
            .iter()
            .map(|c| to_chroma_metadata(&c.metadata))
            .collect::<DocentResult<Vec<_>>>()?;

        self.post(
            "upsert",
            json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas
            }),
        )
        .await?;
        Ok(())
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

#[async_trait]
impl DocumentSource for ChromaVectorIndex {
    async fn get_all_documents(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> DocentResult<Vec<DocumentChunk>> {
        let mut body = json!({ "include": ["documents", "metadatas"] });
        if let Some(limit) = limit {
            body["limit"] = json!(limit);
        }
        if let Some(clause) = filter.and_then(build_where) {
            body["where"] = clause;
        }

        let result = self.post("get", body).await?;
        Ok(parse_get_response(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::types::{FilterCondition, Visibility};

    #[test]
    fn test_build_where() {
        assert_eq!(build_where(&MetadataFilter::new()), None);
        assert_eq!(
            build_where(&MetadataFilter::eq("dataset", "hr_data")),
            Some(json!({ "dataset": { "$eq": "hr_data" } }))
        );

        let filter = MetadataFilter::eq("dataset", "it_assets").and(FilterCondition::in_list(
            "visibility",
            vec![json!("public"), json!("hr")],
        ));
        assert_eq!(
            build_where(&filter),
            Some(json!({ "$and": [
                { "dataset": { "$eq": "it_assets" } },
                { "visibility": { "$in": ["public", "hr"] } }
            ]}))
        );
    }

    #[test]
    fn test_metadata_flattening() {
        let mut metadata = ChunkMetadata::default()
            .with_source("a.csv")
            .with_visibility(Visibility::Private)
            .with_owner("42");
        metadata.extra.insert("tags".into(), json!(["x", "y"]));
        metadata.extra.insert("row".into(), json!(7));

        let flat = to_chroma_metadata(&metadata).unwrap();
        assert_eq!(flat["visibility"], json!("private"));
        assert_eq!(flat["owner_user_id"], json!("42"));
        assert_eq!(flat["tags"], json!("[\"x\",\"y\"]"));
        assert_eq!(flat["row"], json!(7));
        assert!(!flat.contains_key("dataset"));
    }

    #[test]
    fn test_parse_query_response() {
        let result = json!({
            "ids": [["c1", "c2"]],
            "documents": [["vpn setup", "printer"]],
            "metadatas": [[{ "visibility": "hr", "source": "s" }, null]],
            "distances": [[0.25, 0.75]]
        });
        let hits = parse_query_response(&result);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.as_deref(), Some("c1"));
        assert_eq!(hits[0].metadata.visibility, Some(Visibility::Hr));
        assert_eq!(hits[1].text, "printer");
        assert_eq!(hits[1].metadata, ChunkMetadata::default());
        assert!((hits[1].distance - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_parse_get_response() {
        let result = json!({
            "ids": ["c1"],
            "documents": ["hello"],
            "metadatas": [{ "dataset": "hr_local" }]
        });
        let docs = parse_get_response(&result);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "c1");
        assert_eq!(docs[0].metadata.dataset.as_deref(), Some("hr_local"));
    }
}
