//! CodeMate API - HTTP gateway
//!
//! Exposes the query pipeline over HTTP: one query endpoint plus
//! health, readiness, and counters. Transport concerns (CORS, request
//! tracing, panic recovery) are tower layers around the router.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::query::query_handler,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::metrics,
    ),
    components(schemas(
        handlers::query::QueryRequest,
        handlers::query::QueryResponse,
        handlers::query::SourceDto,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ReadinessChecks,
        handlers::health::MetricsResponse,
        error::ApiError,
    )),
    tags(
        (name = "query", description = "Codebase question answering"),
        (name = "health", description = "Service health and counters")
    )
)]
struct ApiDoc;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(parsed)
    }
}

/// Assemble the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api/v1", routes::api_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
