//! Vector store abstraction.
//!
//! Vectors live in two namespaces: `code` for source chunks and `docs` for
//! markup chunks. The concrete backend is a managed external service; an
//! in-memory implementation backs tests and offline runs.

pub mod memory;
pub mod pinecone;

pub use memory::MemoryVectorStore;
pub use pinecone::PineconeStore;

use crate::types::ChunkMetadata;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Partition within the vector store separating code from documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Code,
    Docs,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Code, Namespace::Docs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Code => "code",
            Namespace::Docs => "docs",
        }
    }

    /// Markdown chunks go to `docs`, everything else to `code`
    pub fn for_language(language: &str) -> Self {
        if language == "markdown" {
            Namespace::Docs
        } else {
            Namespace::Code
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vector plus its metadata, as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// One ranked result of a similarity query
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Trait for vector store operations
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert-or-replace records, keyed by id. Returns the number stored.
    async fn upsert(&self, namespace: Namespace, records: Vec<VectorRecord>) -> Result<usize>;

    /// Similarity search returning the top `top_k` matches
    async fn query(
        &self,
        namespace: Namespace,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>>;

    /// Delete specific vectors by id
    async fn delete_ids(&self, namespace: Namespace, ids: &[String]) -> Result<()>;

    /// Delete every vector in the namespace
    async fn delete_all(&self, namespace: Namespace) -> Result<()>;
}
