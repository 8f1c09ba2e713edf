//! Embedding clients for generating vector representations of query text
//!
//! Supports OpenAI and Ollama embedding APIs.

use async_trait::async_trait;
use codemate_core::{BackendError, BackendResult, EmbeddingClient, LlmConfig, PipelineError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Map a non-success HTTP status to a backend error.
///
/// 429 and 5xx are transient; anything else means the request itself was
/// rejected and a retry will not help.
pub(crate) fn classify_status(status: StatusCode, body: String) -> BackendError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        BackendError::Busy(format!("{status}: {body}"))
    } else {
        BackendError::Malformed(format!("{status}: {body}"))
    }
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536, // Default
        };

        Self {
            client,
            api_key: api_key.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(client: Client, config: &LlmConfig) -> codemate_core::Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| PipelineError::Config("OpenAI API key required".to_string()))?;

        Ok(Self::new(
            client,
            api_key.clone(),
            config.embedding_model.clone(),
        ))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> BackendResult<Vec<f32>> {
        let request = OpenAiEmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, error_text));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            BackendError::Malformed(format!("failed to parse embedding response: {e}"))
        })?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| BackendError::Malformed("no embedding returned".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768, // Default for most models
        };

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(client: Client, config: &LlmConfig) -> Self {
        Self::new(client, config.ollama_url.clone(), config.embedding_model.clone())
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> BackendResult<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                BackendError::Unreachable(format!("Ollama embedding request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, error_text));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            BackendError::Malformed(format!("failed to parse embedding response: {e}"))
        })?;

        Ok(result.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config.
///
/// The HTTP client is injected so every backend shares one connection pool
/// owned by the caller.
pub fn create_embedding_client(
    client: Client,
    config: &LlmConfig,
) -> codemate_core::Result<Box<dyn EmbeddingClient>> {
    use codemate_core::LlmProvider;

    match config.provider {
        LlmProvider::OpenAI | LlmProvider::Azure => {
            Ok(Box::new(OpenAiEmbedding::from_config(client, config)?))
        }
        LlmProvider::Ollama => Ok(Box::new(OllamaEmbedding::from_config(client, config))),
    }
}

// ============================================================================
// Tests
// ============================================================================
