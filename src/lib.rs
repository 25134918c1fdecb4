//! # repo-index - Incremental Codebase Embedding Indexer
//!
//! Keeps an external, namespaced vector store eventually consistent with a
//! source tree: scan, chunk, embed, upsert, with git-diff-driven incremental
//! updates and a persisted manifest for exact pruning.
//!
//! ## Overview
//!
//! A run scans the repository (gitignore-aware, include/exclude globs), then
//! either clears the store for a full reindex or diffs the working tree
//! against the last indexed revision and prunes stale vectors. Changed files
//! are chunked by structure (markdown headings, tree-sitter declarations, or
//! fixed-size slices), embedded in rate-limited batches through an external
//! embedding service, and upserted into the `code` and `docs` namespaces of
//! the vector store.
//!
//! ## Modules
//!
//! - [`scanner`]: file discovery and git change detection
//! - [`chunker`]: markdown, syntax-aware, and fixed-size splitting
//! - [`embedding`]: embedding provider trait, Gemini client, batching
//! - [`vector_store`]: vector store trait, Pinecone client, in-memory store
//! - [`indexer`]: deterministic ids, namespace grouping, upserts, deletion
//! - [`manifest`]: persisted watermark and path -> vector-id records
//! - [`pipeline`]: the orchestrator tying the stages together
//! - [`search`]: read-only semantic search over the indexed store
//! - [`config`]: configuration with .env discovery and env overrides
//! - [`types`]: chunk, diff, and report types
//! - [`error`]: error types
//!
//! ## Usage Example
//!
//! ```no_run
//! use repo_index::config::{Config, DotEnv};
//! use repo_index::embedding::GeminiEmbedder;
//! use repo_index::pipeline::Pipeline;
//! use repo_index::types::IndexMode;
//! use repo_index::vector_store::PineconeStore;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let env = DotEnv::discover(std::env::current_dir()?);
//!     let config = Config::load(&env)?;
//!
//!     let provider = Arc::new(GeminiEmbedder::new(&config.embedding)?);
//!     let store = Arc::new(PineconeStore::new(&config.store)?);
//!
//!     let pipeline = Pipeline::new(env.root().to_path_buf(), config, provider, store);
//!     let report = pipeline.run(IndexMode::Incremental).await?;
//!     println!("upserted {} vectors", report.vectors_upserted);
//!     Ok(())
//! }
//! ```

/// File chunking strategies and routing
pub mod chunker;

/// Configuration with .env discovery and environment overrides
pub mod config;

/// Embedding provider trait, Gemini client, and batch processing
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Deterministic ids, namespace grouping, and store writes
pub mod indexer;

/// Persisted watermark and per-file vector-id records
pub mod manifest;

/// Pipeline orchestrator
pub mod pipeline;

/// File discovery and git change detection
pub mod scanner;

/// Read-only semantic search over the indexed store
pub mod search;

/// Core data types shared across the pipeline
pub mod types;

/// Vector store abstraction and backends
pub mod vector_store;
