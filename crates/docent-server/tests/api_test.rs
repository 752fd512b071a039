//! HTTP-level tests for the REST API.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use docent_core::config::DocentConfig;
use docent_core::error::DocentResult;
use docent_core::memory::{ConversationStore, FeedbackStore};
use docent_core::retrieval::RetrievalConfig;
use docent_core::traits::{DistanceMetric, Embedder};
use docent_server::{create_server, AppState, Services};
use docent_vector_stores::{InMemoryVectorIndex, VectorStoreHandle};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Embeds text as keyword flags plus a constant component.
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_query(&self, text: &str) -> DocentResult<Vec<f32>> {
        let text = text.to_lowercase();
        let flag = |word: &str| if text.contains(word) { 1.0 } else { 0.0 };
        Ok(vec![flag("vpn"), flag("benefit"), flag("salary"), 0.1])
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

async fn test_app() -> Router {
    test_app_with_feedback(FeedbackStore::in_memory()).await
}

async fn test_app_with_feedback(feedback: FeedbackStore) -> Router {
    let config = DocentConfig::builder()
        .retrieval(RetrievalConfig::hybrid(5).with_min_relevance(0.0))
        .build();
    let store = VectorStoreHandle::new(Arc::new(InMemoryVectorIndex::new(
        "test",
        DistanceMetric::Cosine,
    )));
    let services = Services::new(Arc::new(KeywordEmbedder), store);
    let conversations = ConversationStore::in_memory().unwrap();

    let state = AppState::new(config, services, conversations, feedback)
        .await
        .unwrap();
    create_server(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn corpus() -> Value {
    json!({
        "dataset": "hr_data",
        "documents": [
            {
                "id": "vpn",
                "text": "VPN setup guide: install the client and connect to the VPN gateway.",
                "source": "/kb/it/vpn.md"
            },
            {
                "id": "benefits",
                "text": "Benefits enrollment opens in November for all staff.",
                "source": "/kb/hr/benefits.md"
            },
            {
                "id": "salary",
                "text": "Salary review notes for employee e1.",
                "source": "/data/hr_data/employee_data.csv",
                "metadata": { "employee_id": "e1" }
            }
        ]
    })
}

fn result_ids(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_reports_dense_fallback_on_empty_store() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["requested_mode"], "hybrid");
    assert_eq!(body["effective_mode"], "dense");
    assert_eq!(body["reranker"], false);
}

#[tokio::test]
async fn test_ingest_rebuilds_engine() {
    let app = test_app().await;

    let (status, body) = send(&app, "POST", "/ingest", Some(corpus())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["count"], 3);
    assert_eq!(body["indexed_documents"], 3);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["effective_mode"], "hybrid");
    assert_eq!(health["indexed_documents"], 3);
}

#[tokio::test]
async fn test_ingest_empty_documents() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/ingest",
        Some(json!({ "dataset": "hr_policies", "documents": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_retrieve_hybrid_ranking() {
    let app = test_app().await;
    send(&app, "POST", "/ingest", Some(corpus())).await;

    let (status, body) = send(
        &app,
        "POST",
        "/retrieve",
        Some(json!({ "query": "vpn setup", "user_id": "e2", "role": "employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let ids = result_ids(&body);
    assert_eq!(ids.first().map(String::as_str), Some("vpn-chunk-0"));
    assert!(body["results"][0]["hybrid_score"].as_f64().unwrap() > 0.9);
    assert!(body["results"][0]["metadata"]["dataset"] == "hr_data");
}

#[tokio::test]
async fn test_retrieve_applies_rbac() {
    let app = test_app().await;
    send(&app, "POST", "/ingest", Some(corpus())).await;

    let query = |user: &str, role: &str| json!({ "query": "salary review", "user_id": user, "role": role });

    let (_, owner) = send(&app, "POST", "/retrieve", Some(query("e1", "employee"))).await;
    assert!(result_ids(&owner).contains(&"salary-chunk-0".to_string()));

    let (_, other) = send(&app, "POST", "/retrieve", Some(query("e2", "employee"))).await;
    assert!(!result_ids(&other).contains(&"salary-chunk-0".to_string()));

    let (_, hr) = send(&app, "POST", "/retrieve", Some(query("h1", "HR"))).await;
    assert!(result_ids(&hr).contains(&"salary-chunk-0".to_string()));
}

#[tokio::test]
async fn test_retrieve_rejects_empty_query() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/retrieve",
        Some(json!({ "query": "   ", "user_id": "e1", "role": "employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_conversation_roundtrip() {
    let app = test_app().await;

    for (q, a) in [("first?", "one"), ("second?", "two"), ("third?", "three")] {
        let (status, turn) = send(
            &app,
            "POST",
            "/conversations/u1",
            Some(json!({ "question": q, "answer": a })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["user_id"], "u1");
    }

    let (_, snapshot) = send(&app, "GET", "/conversations/u1?limit=2", None).await;
    let history = snapshot["conversation_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["question"], "second?");
    assert_eq!(history[1]["question"], "third?");

    let (_, all) = send(&app, "GET", "/conversations/u1?limit=0", None).await;
    assert_eq!(all["conversation_history"].as_array().unwrap().len(), 3);

    let (_, empty) = send(&app, "GET", "/conversations/nobody", None).await;
    assert!(empty["conversation_history"].as_array().unwrap().is_empty());
    assert_eq!(empty["user_profile"], json!({}));
}

#[tokio::test]
async fn test_profile_merge() {
    let app = test_app().await;

    send(
        &app,
        "PUT",
        "/conversations/u1/profile",
        Some(json!({ "updates": { "team": "it", "city": "Oslo" } })),
    )
    .await;
    let (status, profile) = send(
        &app,
        "PUT",
        "/conversations/u1/profile",
        Some(json!({ "updates": { "city": "Bergen" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile, json!({ "team": "it", "city": "Bergen" }));

    let (_, snapshot) = send(&app, "GET", "/conversations/u1", None).await;
    assert_eq!(snapshot["user_profile"]["team"], "it");
}

#[tokio::test]
async fn test_feedback_is_recorded() {
    let feedback = FeedbackStore::in_memory();
    let app = test_app_with_feedback(feedback.clone()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/feedback",
        Some(json!({
            "user_id": "e1",
            "role": "employee",
            "question": "How do I set up the VPN?",
            "answer": "Install the client.",
            "rating": 1,
            "context_sources": ["/kb/it/vpn.md"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(
        &app,
        "POST",
        "/feedback",
        Some(json!({
            "user_id": "e1",
            "role": "employee",
            "question": "How do I set up the VPN?",
            "answer": "Install the client.",
            "rating": 11
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VAL_001");

    let records = feedback.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, "e1");
    assert_eq!(records[0].rating, 1);
    assert_eq!(records[0].sources, vec!["/kb/it/vpn.md".to_string()]);
    assert!(records[0].comment.is_none());
}
