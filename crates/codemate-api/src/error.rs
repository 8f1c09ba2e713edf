//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use codemate_core::PipelineError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Pipeline(PipelineError),
    NotReady,
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("NOT_READY", "Query pipeline is not initialized"),
            ),
            AppError::Pipeline(err) => match err {
                PipelineError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, ApiError::new("INVALID_INPUT", msg))
                }
                PipelineError::EmbeddingFailed(msg) => (
                    StatusCode::BAD_GATEWAY,
                    ApiError::new("EMBEDDING_FAILED", "Failed to embed the question")
                        .with_details(msg),
                ),
                PipelineError::RetrievalUnavailable(msg) => (
                    StatusCode::BAD_GATEWAY,
                    ApiError::new("RETRIEVAL_UNAVAILABLE", "Vector index is unavailable")
                        .with_details(msg),
                ),
                PipelineError::RetrievalTimeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    ApiError::new("RETRIEVAL_TIMEOUT", "Vector search timed out"),
                ),
                PipelineError::GenerationFailed(msg) => (
                    StatusCode::BAD_GATEWAY,
                    ApiError::new("GENERATION_FAILED", "Model backend failed").with_details(msg),
                ),
                PipelineError::GenerationTimeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    ApiError::new("GENERATION_TIMEOUT", "Answer generation timed out"),
                ),
                PipelineError::Config(msg) => {
                    tracing::error!(error = %msg, "configuration error surfaced on request path");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::internal_error(),
                    )
                }
                PipelineError::Internal(err) => {
                    tracing::error!(error = ?err, "unexpected internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::internal_error(),
                    )
                }
            },
        };

        (status, Json(error)).into_response()
    }
}
