//! Embedding generation against an external embedding service.
//!
//! Document and query embeddings use asymmetric task hints: file content is
//! embedded with the document hint, search queries with the query hint. The
//! two are optimized differently by the service and only compare correctly
//! across the pair, so they must never be swapped.

mod batch;
mod gemini;

pub use batch::{BatchOptions, BatchSink, embed_batch, embed_in_batches};
pub use gemini::GeminiEmbedder;

use crate::types::Chunk;
use anyhow::Result;

/// Which side of the retrieval pair a text belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Indexed file content
    Document,
    /// A search query
    Query,
}

impl EmbeddingTask {
    pub(crate) fn as_api_str(&self) -> &'static str {
        match self {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Trait for embedding generation
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text, returning a vector of the configured dimension
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>>;

    /// Dimensionality of produced vectors
    fn dimension(&self) -> usize;
}

/// A chunk paired with its embedding vector
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}
