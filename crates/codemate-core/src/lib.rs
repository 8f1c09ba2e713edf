//! CodeMate Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout CodeMate:
//! - Query pipeline value types (queries, candidates, assembled context, results)
//! - Pipeline error taxonomy
//! - Collaborator traits (embedding, vector index, model backend)
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, LlmConfig, LlmProvider, LoggingConfig, PipelineConfig,
    ServerConfig,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors a query can terminate with, one variant per failure kind the
/// pipeline distinguishes.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("vector index unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("retrieval timed out")]
    RetrievalTimeout,

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("generation timed out")]
    GenerationTimeout,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure reported by an external collaborator call (embedding service,
/// vector index, or model backend).
///
/// `Unreachable` and `Busy` are transient and eligible for retry;
/// `Malformed` is not.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend busy: {0}")]
    Busy(String),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Whether a retry is expected to help.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Busy(_))
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

// ============================================================================
// Symbol Kinds
// ============================================================================

/// Kind of code artifact a candidate points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Module,
    Variable,
    File,
    Other,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Module => "module",
            Self::Variable => "variable",
            Self::File => "file",
            Self::Other => "other",
        }
    }

    /// Parse a kind from index payload data. Unknown kinds fold into `Other`
    /// so a payload written by a newer indexer never fails a query.
    pub fn parse(s: &str) -> Self {
        match s {
            "function" => Self::Function,
            "method" => Self::Method,
            "class" => Self::Class,
            "struct" => Self::Struct,
            "module" => Self::Module,
            "variable" => Self::Variable,
            "file" => Self::File,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Pipeline Value Types
// ============================================================================

/// A validated query, produced by the normalizer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Trimmed, non-empty question text.
    pub question: String,

    /// Requested result count, clamped into `[1, max_results_cap]`.
    pub max_results: usize,
}

/// A scored code artifact returned by retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Path of the file the symbol lives in.
    pub file_path: String,

    /// Symbol name (function, class, ...).
    pub symbol: String,

    /// Kind of artifact.
    pub kind: SymbolKind,

    /// Relevance score in `[0, 1]`.
    pub score: f32,

    /// Content snippet used as generation context.
    pub snippet: String,
}

impl Candidate {
    /// Size this candidate contributes to the context budget.
    pub fn size(&self) -> usize {
        self.snippet.len()
    }

    /// Identity used for deduplication.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.file_path.as_str(), self.symbol.as_str())
    }
}

/// Ordered candidates selected for generation plus the budget they consume.
///
/// Invariant: `consumed` is the sum of candidate sizes and never exceeds the
/// budget the assembler was given.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    pub candidates: Vec<Candidate>,
    pub consumed: usize,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Generated answer text plus the candidates it is attributed to.
///
/// `cited` is a subset of the assembled context, in context order.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub cited: Vec<Candidate>,
}

/// A source citation in the externally visible result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub file_path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub score: f32,
}

impl From<&Candidate> for Source {
    fn from(c: &Candidate) -> Self {
        Self {
            file_path: c.file_path.clone(),
            name: c.symbol.clone(),
            kind: c.kind,
            score: c.score,
        }
    }
}

/// The externally visible outcome of a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Computes vector embeddings of query text.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> BackendResult<Vec<f32>>;

    /// Embedding dimension produced by this client.
    fn dimension(&self) -> usize;
}

/// K-nearest-neighbor search over an external vector index of code artifacts.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` candidates ordered by descending score.
    async fn search(&self, embedding: &[f32], limit: usize) -> BackendResult<Vec<Candidate>>;
}

/// Model backend that turns a prompt into answer text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> BackendResult<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_kind_roundtrip() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Class,
            SymbolKind::Struct,
            SymbolKind::Module,
            SymbolKind::Variable,
            SymbolKind::File,
        ] {
            assert_eq!(SymbolKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn symbol_kind_unknown_folds_to_other() {
        assert_eq!(SymbolKind::parse("macro"), SymbolKind::Other);
        assert_eq!(SymbolKind::parse(""), SymbolKind::Other);
    }

    #[test]
    fn source_serializes_kind_as_type() {
        let source = Source {
            file_path: "src/auth.rs".to_string(),
            name: "verify_token".to_string(),
            kind: SymbolKind::Function,
            score: 0.9,
        };

        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["file_path"], "src/auth.rs");
    }

    #[test]
    fn backend_error_transience() {
        assert!(BackendError::Unreachable("refused".into()).is_transient());
        assert!(BackendError::Busy("overloaded".into()).is_transient());
        assert!(!BackendError::Malformed("bad json".into()).is_transient());
    }

    #[test]
    fn candidate_size_counts_snippet_bytes() {
        let candidate = Candidate {
            file_path: "src/main.rs".to_string(),
            symbol: "main".to_string(),
            kind: SymbolKind::Function,
            score: 1.0,
            snippet: "fn main() {}".to_string(),
        };
        assert_eq!(candidate.size(), 12);
    }
}
