//! CodeMate RAG - Query Answering Pipeline
//!
//! This crate implements the pipeline that turns a natural-language question
//! about a codebase into an answer with source citations:
//!
//! normalize → retrieve → assemble → generate → compose
//!
//! Stages execute strictly sequentially within one request and each produces
//! a fresh value from its input. Retries, backoff, and timeouts live inside
//! the retriever and the generator; the pipeline itself never retries.

pub mod assemble;
pub mod compose;
pub mod deadline;
pub mod generate;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod retrieve;

pub use assemble::assemble;
pub use compose::compose;
pub use deadline::RequestCtx;
pub use generate::{AnswerGenerator, NO_CONTEXT_ANSWER};
pub use llm::{create_llm_client, OllamaClient, OpenAiClient};
pub use normalize::normalize;
pub use pipeline::{QueryPipeline, Stage};
pub use retrieve::Retriever;
