//! API Integration Tests
//!
//! Drive the router end to end with stubbed collaborators standing in for
//! the vector index and model backend.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use codemate_api::{create_router, state::AppState};
use codemate_core::{
    AppConfig, BackendError, BackendResult, Candidate, EmbeddingClient, LlmClient, SymbolKind,
    VectorIndex,
};
use codemate_rag::QueryPipeline;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

// =============================================================================
// Stub collaborators
// =============================================================================

struct StubEmbedding;

#[async_trait]
impl EmbeddingClient for StubEmbedding {
    async fn embed(&self, _text: &str) -> BackendResult<Vec<f32>> {
        Ok(vec![0.0; 8])
    }

    fn dimension(&self) -> usize {
        8
    }
}

struct StubIndex {
    results: Vec<Candidate>,
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn search(&self, _embedding: &[f32], limit: usize) -> BackendResult<Vec<Candidate>> {
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

struct DeadIndex;

#[async_trait]
impl VectorIndex for DeadIndex {
    async fn search(&self, _embedding: &[f32], _limit: usize) -> BackendResult<Vec<Candidate>> {
        Err(BackendError::Unreachable("connection refused".into()))
    }
}

struct SlowIndex;

#[async_trait]
impl VectorIndex for SlowIndex {
    async fn search(&self, _embedding: &[f32], _limit: usize) -> BackendResult<Vec<Candidate>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

struct StubLlm;

#[async_trait]
impl LlmClient for StubLlm {
    async fn generate(&self, _prompt: &str) -> BackendResult<String> {
        Ok("The token is verified in middleware. [source: 1]".to_string())
    }
}

fn candidate(symbol: &str, score: f32) -> Candidate {
    Candidate {
        file_path: format!("src/{symbol}.rs"),
        symbol: symbol.to_string(),
        kind: SymbolKind::Function,
        score,
        snippet: format!("fn {symbol}() {{}}"),
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.pipeline.retrieval_timeout_ms = 100;
    config.pipeline.generation_timeout_ms = 200;
    config.pipeline.backoff_base_ms = 1;
    config
}

async fn app_with(index: Arc<dyn VectorIndex>, llm: Arc<dyn LlmClient>) -> Router {
    let config = test_config();
    let pipeline = Arc::new(QueryPipeline::new(
        Arc::new(StubEmbedding),
        index,
        llm,
        config.pipeline.clone(),
    ));

    let state = Arc::new(AppState::new(config));
    state.set_pipeline(pipeline).await;
    create_router(state)
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = app_with(Arc::new(StubIndex { results: vec![] }), Arc::new(StubLlm)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = app_with(Arc::new(StubIndex { results: vec![] }), Arc::new(StubLlm)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"]["pipeline_initialized"], true);
}

#[tokio::test]
async fn test_readiness_before_pipeline_init() {
    let state = Arc::new(AppState::new(test_config()));
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = app_with(Arc::new(StubIndex { results: vec![] }), Arc::new(StubLlm)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["uptime_seconds"].is_number());
    assert!(json["total_requests"].is_number());
    assert_eq!(json["ready"], true);
}

// =============================================================================
// Query API Tests
// =============================================================================

#[tokio::test]
async fn test_query_success_with_sources() {
    let index = Arc::new(StubIndex {
        results: vec![candidate("verify_token", 0.92), candidate("login", 0.81)],
    });
    let app = app_with(index, Arc::new(StubLlm)).await;

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({
            "question": "How does request authentication work?",
            "max_results": 3
        })),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["answer"],
        "The token is verified in middleware. [source: 1]"
    );

    let sources = json["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["file_path"], "src/verify_token.rs");
    assert_eq!(sources[0]["name"], "verify_token");
    assert_eq!(sources[0]["type"], "function");
    assert!(sources[0]["score"].is_number());
}

#[tokio::test]
async fn test_query_empty_question_is_bad_request() {
    let app = app_with(Arc::new(StubIndex { results: vec![] }), Arc::new(StubLlm)).await;

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({ "question": "   " })),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_query_missing_question_field_is_rejected() {
    let app = app_with(Arc::new(StubIndex { results: vec![] }), Arc::new(StubLlm)).await;

    let request = create_json_request("POST", "/api/v1/query", Some(json!({ "max_results": 3 })));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_query_unavailable_index_maps_to_bad_gateway() {
    let app = app_with(Arc::new(DeadIndex), Arc::new(StubLlm)).await;

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({ "question": "anything?" })),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "RETRIEVAL_UNAVAILABLE");
}

#[tokio::test]
async fn test_query_slow_index_maps_to_gateway_timeout() {
    let app = app_with(Arc::new(SlowIndex), Arc::new(StubLlm)).await;

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({ "question": "anything?" })),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "RETRIEVAL_TIMEOUT");
}

#[tokio::test]
async fn test_query_before_pipeline_init_is_service_unavailable() {
    let state = Arc::new(AppState::new(test_config()));
    let app = create_router(state);

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({ "question": "anything?" })),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_READY");
}

#[tokio::test]
async fn test_query_empty_index_answers_without_sources() {
    let app = app_with(Arc::new(StubIndex { results: vec![] }), Arc::new(StubLlm)).await;

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({ "question": "anything?" })),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["answer"].as_str().unwrap().contains("No relevant context"));
    assert_eq!(json["sources"].as_array().unwrap().len(), 0);
}
