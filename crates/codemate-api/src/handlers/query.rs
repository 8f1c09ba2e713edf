//! Query handler

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use codemate_core::QueryResult;
use codemate_rag::RequestCtx;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Query request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// User's question about the codebase
    #[schema(example = "How does request authentication work?")]
    pub question: String,

    /// Maximum number of sources to retrieve
    #[serde(default)]
    #[schema(example = 5)]
    pub max_results: Option<i64>,
}

/// A cited source in the response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SourceDto {
    /// Path of the file the symbol lives in
    #[schema(example = "src/auth/middleware.rs")]
    pub file_path: String,

    /// Symbol name
    #[schema(example = "verify_token")]
    pub name: String,

    /// Symbol kind
    #[serde(rename = "type")]
    #[schema(example = "function")]
    pub kind: String,

    /// Relevance score
    #[schema(example = 0.92)]
    pub score: f32,
}

/// Query response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,

    /// Sources the answer is attributed to
    pub sources: Vec<SourceDto>,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            answer: result.answer,
            sources: result
                .sources
                .into_iter()
                .map(|s| SourceDto {
                    file_path: s.file_path,
                    name: s.name,
                    kind: s.kind.to_string(),
                    score: s.score,
                })
                .collect(),
        }
    }
}

/// Handle codebase query requests
#[utoipa::path(
    post,
    path = "/api/v1/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query answered", body = QueryResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 502, description = "Upstream dependency failed", body = crate::error::ApiError),
        (status = 504, description = "Upstream dependency timed out", body = crate::error::ApiError)
    )
)]
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let pipeline = state.pipeline().await.ok_or(AppError::NotReady)?;

    let ctx = RequestCtx::new(state.config.server.request_timeout());
    let result = pipeline.execute(&req.question, req.max_results, &ctx).await?;

    Ok((StatusCode::OK, Json(QueryResponse::from(result))))
}
