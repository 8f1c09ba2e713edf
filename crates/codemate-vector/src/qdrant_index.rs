//! Qdrant implementation of the vector index
//!
//! Provides connection management and similarity search over the
//! collection holding the indexed codebase.

use async_trait::async_trait;
use codemate_core::{
    BackendError, BackendResult, Candidate, DatabaseConfig, PipelineError, SymbolKind, VectorIndex,
};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, SearchPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;

/// Qdrant-backed vector index
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantIndex {
    /// Create a new Qdrant connection
    pub fn new(config: &DatabaseConfig) -> codemate_core::Result<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .build()
            .map_err(|e| PipelineError::Config(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.qdrant_collection.clone(),
            dimension: config.vector_dimension,
        })
    }

    /// Create the collection if it does not exist (run once on setup).
    ///
    /// The index itself is populated by an external indexer; this only
    /// bootstraps an empty collection so a fresh deployment can answer
    /// queries (with no sources) instead of erroring.
    pub async fn ensure_collection(&self) -> codemate_core::Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| PipelineError::RetrievalUnavailable(format!("list collections: {e}")))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| {
                    PipelineError::RetrievalUnavailable(format!("create collection: {e}"))
                })?;
        }

        Ok(())
    }

    /// Check that the index answers. Used by the readiness probe.
    pub async fn ping(&self) -> bool {
        self.client.list_collections().await.is_ok()
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(&self, embedding: &[f32], limit: usize) -> BackendResult<Vec<Candidate>> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| BackendError::Unreachable(format!("vector search failed: {e}")))?;

        let candidates: Vec<Candidate> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;

                // A point without a file path is unusable as a citation.
                let file_path = payload
                    .get("file_path")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())?;

                let symbol = payload
                    .get("symbol")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let kind = payload
                    .get("kind")
                    .and_then(|v| v.as_str())
                    .map(|s| SymbolKind::parse(s))
                    .unwrap_or(SymbolKind::Other);

                let snippet = payload
                    .get("snippet")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                Some(Candidate {
                    file_path,
                    symbol,
                    kind,
                    score: point.score.clamp(0.0, 1.0),
                    snippet,
                })
            })
            .collect();

        tracing::debug!(results = candidates.len(), "vector search complete");
        Ok(candidates)
    }
}
