//! Read-only consumers of the vector store: semantic code search, semantic
//! documentation search, and raw file retrieval by path.
//!
//! Queries are embedded with the query task hint; stored vectors were
//! embedded with the document hint. See [`crate::embedding::EmbeddingTask`].

use crate::embedding::{EmbeddingProvider, EmbeddingTask};
use crate::types::ChunkKind;
use crate::vector_store::{Namespace, VectorStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub struct SearchClient {
    root: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

/// One ranked search result with file and line metadata
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub file_path: String,
    pub file_name: String,
    pub name: String,
    pub chunk_type: ChunkKind,
    pub start_line: usize,
    pub end_line: usize,
    pub score: f32,
}

impl SearchClient {
    pub fn new(
        root: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            root: root.into(),
            provider,
            store,
        }
    }

    /// Semantic search across source code chunks
    pub async fn search_code(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.search(Namespace::Code, query, limit).await
    }

    /// Semantic search across documentation chunks
    pub async fn search_docs(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.search(Namespace::Docs, query, limit).await
    }

    async fn search(
        &self,
        namespace: Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let vector = self
            .provider
            .embed(query, EmbeddingTask::Query)
            .await
            .context("failed to embed query")?;
        let matches = self.store.query(namespace, vector, limit).await?;

        Ok(matches
            .into_iter()
            .map(|m| SearchHit {
                file_path: m.metadata.file_path,
                file_name: m.metadata.file_name,
                name: m.metadata.name,
                chunk_type: m.metadata.chunk_type,
                start_line: m.metadata.start_line,
                end_line: m.metadata.end_line,
                score: m.score,
            })
            .collect())
    }

    /// Raw file retrieval by repository-relative path
    pub fn get_file(&self, path: &str) -> Result<String> {
        let relative = Path::new(path);
        anyhow::ensure!(
            relative.is_relative(),
            "path must be relative to the repository root"
        );
        anyhow::ensure!(
            !relative
                .components()
                .any(|component| matches!(component, Component::ParentDir)),
            "path must not escape the repository root"
        );

        fs::read_to_string(self.root.join(relative))
            .with_context(|| format!("failed to read {}", path))
    }
}
