//! CodeMate Vector - Embedding clients and vector index access
//!
//! Provides the embedding clients (Ollama, OpenAI) used to embed query
//! text and the Qdrant-backed implementation of the `VectorIndex` trait
//! for similarity search over an indexed codebase.

pub mod embedding;
pub mod qdrant_index;

pub use embedding::{create_embedding_client, OllamaEmbedding, OpenAiEmbedding};
pub use qdrant_index::QdrantIndex;
