//! Query embedding and k-nearest-neighbor retrieval

use crate::deadline::{bounded, RequestCtx};
use codemate_core::{
    BackendError, Candidate, EmbeddingClient, PipelineConfig, PipelineError, Query, Result,
    VectorIndex,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieves scored candidates for a normalized query.
///
/// Owns no state across calls; both collaborators are shared handles. The
/// embedding call runs under `embedding_timeout`, the search (including its
/// retries) under `retrieval_timeout`, and both under the request deadline.
pub struct Retriever {
    embedding: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    config: PipelineConfig,
}

impl Retriever {
    pub fn new(
        embedding: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedding,
            index,
            config,
        }
    }

    /// Embed the query text and search the index, k = requested max results.
    /// Candidates come back ordered by descending score.
    pub async fn retrieve(&self, query: &Query, ctx: &RequestCtx) -> Result<Vec<Candidate>> {
        let embedding = bounded(
            ctx,
            self.config.embedding_timeout(),
            self.embedding.embed(&query.question),
        )
        .await
        .ok_or(PipelineError::RetrievalTimeout)?
        .map_err(|e| PipelineError::EmbeddingFailed(e.to_string()))?;

        debug!(dimension = embedding.len(), "query embedded");

        let mut candidates = bounded(
            ctx,
            self.config.retrieval_timeout(),
            self.search_with_retry(&embedding, query.max_results),
        )
        .await
        .ok_or(PipelineError::RetrievalTimeout)??;

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(query.max_results);
        Ok(candidates)
    }

    /// Search the index, retrying transient failures with exponential
    /// backoff. The caller bounds the whole sequence with the stage timeout.
    async fn search_with_retry(&self, embedding: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let mut last_err: Option<BackendError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.backoff_base() * 2u32.pow(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying vector search");
                tokio::time::sleep(delay).await;
            }

            match self.index.search(embedding, k).await {
                Ok(candidates) => return Ok(candidates),
                Err(e) if e.is_transient() => last_err = Some(e),
                Err(e) => return Err(PipelineError::RetrievalUnavailable(e.to_string())),
            }
        }

        let detail = last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(PipelineError::RetrievalUnavailable(format!(
            "retries exhausted: {detail}"
        )))
    }
}
