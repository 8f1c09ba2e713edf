//! Query pipeline orchestration

use crate::assemble::assemble;
use crate::compose::compose;
use crate::deadline::RequestCtx;
use crate::generate::AnswerGenerator;
use crate::normalize::normalize;
use crate::retrieve::Retriever;
use codemate_core::{
    EmbeddingClient, LlmClient, PipelineConfig, PipelineError, QueryResult, Result, VectorIndex,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

/// Stages a query moves through, in order. A query either reaches the end
/// or terminates in the failing stage's error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalizing,
    Retrieving,
    Assembling,
    Generating,
    Composing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Normalizing => "normalizing",
            Self::Retrieving => "retrieving",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
            Self::Composing => "composing",
        };
        f.write_str(name)
    }
}

/// The full query answering pipeline.
///
/// Holds no cross-request mutable state apart from the admission semaphore;
/// every stage produces a fresh value from its input, so arbitrarily many
/// queries may run concurrently up to the configured cap.
pub struct QueryPipeline {
    retriever: Retriever,
    generator: AnswerGenerator,
    config: PipelineConfig,
    limiter: Semaphore,
}

impl QueryPipeline {
    pub fn new(
        embedding: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedding, index, config.clone()),
            generator: AnswerGenerator::new(llm, config.clone()),
            limiter: Semaphore::new(config.max_concurrent_queries.max(1)),
            config,
        }
    }

    /// Answer one question end to end.
    pub async fn execute(
        &self,
        question: &str,
        max_results: Option<i64>,
        ctx: &RequestCtx,
    ) -> Result<QueryResult> {
        let _permit = self.limiter.acquire().await.map_err(|e| {
            PipelineError::Internal(anyhow::anyhow!("admission queue closed: {e}"))
        })?;

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("query", %request_id);

        async {
            debug!(stage = %Stage::Normalizing);
            let query = normalize(question, max_results, &self.config)?;

            debug!(stage = %Stage::Retrieving, max_results = query.max_results);
            let candidates = self.retriever.retrieve(&query, ctx).await?;
            info!(candidates = candidates.len(), "retrieval complete");

            debug!(stage = %Stage::Assembling);
            let context = assemble(candidates, self.config.context_budget);
            debug!(
                selected = context.len(),
                consumed = context.consumed,
                "context assembled"
            );

            debug!(stage = %Stage::Generating);
            let answer = self.generator.generate(&query.question, &context, ctx).await?;

            debug!(stage = %Stage::Composing);
            let result = compose(answer);
            info!(sources = result.sources.len(), "query answered");

            Ok(result)
        }
        .instrument(span)
        .await
    }
}
