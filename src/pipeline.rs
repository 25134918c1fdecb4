//! Pipeline orchestrator: scan, plan (full clear or diff-and-prune), chunk,
//! embed, upsert, and advance the watermark.
//!
//! Stages run strictly in sequence. Per-file failures are logged and skipped;
//! any embedding or store failure aborts the run. Embedded batches are
//! upserted and the manifest saved as they complete, so a late failure keeps
//! earlier batches durable. The watermark only advances after a fully
//! successful run, so a failed run is re-driven from the same base revision.

use crate::chunker::Chunker;
use crate::config::Config;
use crate::embedding::{
    BatchOptions, BatchSink, EmbeddedChunk, EmbeddingProvider, embed_in_batches,
};
use crate::indexer::Indexer;
use crate::manifest::IndexManifest;
use crate::scanner::{FileScanner, GitDiffDetector};
use crate::types::{FileInfo, GitDiffResult, IndexMode, IndexReport};
use crate::vector_store::VectorStore;
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Pipeline {
    root: PathBuf,
    config: Config,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    manifest_path: PathBuf,
}

/// What an indexing run will actually do
enum Plan {
    /// Clear the store and re-embed everything
    Full,
    /// Prune and re-embed only the diffed paths
    Incremental(GitDiffResult),
    /// Nothing changed since the watermark
    NoChanges,
}

impl Pipeline {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Config,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            provider,
            store,
            manifest_path: IndexManifest::default_path(),
        }
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Run the pipeline in the requested mode
    pub async fn run(&self, mode: IndexMode) -> Result<IndexReport> {
        let started = Instant::now();

        let mut manifest = IndexManifest::load(&self.manifest_path)?;
        let detector = GitDiffDetector::new(&self.root);
        let indexer = Indexer::new(self.store.clone(), self.config.store.upsert_batch_size);

        tracing::info!("scanning {}", self.root.display());
        let scanner = FileScanner::new(&self.root, &self.config.scanner)?;
        let files = scanner.scan()?;

        if files.is_empty() {
            tracing::warn!("no files matched the include patterns");
            let mut report = IndexReport::new(mode);
            report.duration_ms = started.elapsed().as_millis() as u64;
            return Ok(report);
        }

        let plan = self.plan(mode, &manifest, &detector).await;
        let mut report = IndexReport::new(match &plan {
            Plan::Full => IndexMode::Full,
            _ => IndexMode::Incremental,
        });
        report.files_scanned = files.len();

        let to_index: Vec<FileInfo> = match plan {
            Plan::NoChanges => {
                tracing::info!("no changes since last indexed revision");
                report.duration_ms = started.elapsed().as_millis() as u64;
                return Ok(report);
            }
            Plan::Full => {
                tracing::info!("clearing vector store for full reindex");
                // drop the watermark first: if this run dies midway, the next
                // incremental run must not trust a stale diff base
                manifest.last_commit = None;
                manifest.clear_files();
                manifest.save(&self.manifest_path)?;
                indexer.clear_all().await?;
                files
            }
            Plan::Incremental(diff) => {
                // prune stored vectors for every changed path before re-adding
                for path in diff.all_paths() {
                    let deleted = indexer.delete_file(&mut manifest, path).await?;
                    if deleted > 0 {
                        report.files_pruned += 1;
                        report.vectors_deleted += deleted;
                    }
                }
                manifest.save(&self.manifest_path)?;

                let changed: HashSet<&str> = diff.changed().map(String::as_str).collect();
                files
                    .into_iter()
                    .filter(|file| changed.contains(file.path.as_str()))
                    .collect()
            }
        };
        report.files_indexed = to_index.len();

        let chunker = Chunker::new(&self.root, &self.config.chunking);
        let mut chunks = Vec::new();
        for file in &to_index {
            match chunker.chunk_file(file) {
                Ok(file_chunks) => chunks.extend(file_chunks),
                Err(error) => tracing::warn!("failed to chunk {}: {:#}", file.path, error),
            }
        }
        report.chunks_created = chunks.len();
        tracing::info!(
            "created {} chunks from {} files",
            report.chunks_created,
            report.files_indexed
        );

        if !chunks.is_empty() {
            let options = BatchOptions {
                batch_size: self.config.embedding.batch_size,
                rate_limit_delay: Duration::from_millis(self.config.embedding.rate_limit_ms),
            };
            let (embedded, upserted) = {
                let mut sink = StoreSink {
                    indexer: &indexer,
                    manifest: &mut manifest,
                    manifest_path: &self.manifest_path,
                    vectors_upserted: 0,
                };
                let embedded =
                    embed_in_batches(self.provider.as_ref(), chunks, &options, &mut sink).await?;
                (embedded, sink.vectors_upserted)
            };
            report.embeddings_generated = embedded;
            report.vectors_upserted = upserted;
        }

        match detector.head_commit() {
            Ok(commit) => manifest.last_commit = Some(commit),
            Err(error) => tracing::warn!("unable to record indexed revision: {:#}", error),
        }
        manifest.save(&self.manifest_path)?;

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "indexing complete: mode={} files={} chunks={} vectors={} pruned={} in {}ms",
            report.mode,
            report.files_indexed,
            report.chunks_created,
            report.vectors_upserted,
            report.files_pruned,
            report.duration_ms
        );
        Ok(report)
    }

    /// Decide between full clear and diff-and-prune. Incremental mode needs a
    /// recorded watermark and a working git invocation; anything else falls
    /// back to a full reindex.
    async fn plan(
        &self,
        mode: IndexMode,
        manifest: &IndexManifest,
        detector: &GitDiffDetector,
    ) -> Plan {
        if mode == IndexMode::Full {
            return Plan::Full;
        }

        let Some(since) = manifest.last_commit.as_deref() else {
            tracing::warn!("no indexed revision recorded, performing a full reindex");
            return Plan::Full;
        };

        match detector.changed_since(since).await {
            Ok(diff) if diff.is_empty() => Plan::NoChanges,
            Ok(diff) => Plan::Incremental(diff),
            Err(error) => {
                tracing::warn!(
                    "change detection failed ({:#}), performing a full reindex",
                    error
                );
                Plan::Full
            }
        }
    }
}

/// Feeds embedded batches straight into the store and keeps the manifest
/// current on disk after every batch.
struct StoreSink<'a> {
    indexer: &'a Indexer,
    manifest: &'a mut IndexManifest,
    manifest_path: &'a Path,
    vectors_upserted: usize,
}

#[async_trait::async_trait]
impl BatchSink for StoreSink<'_> {
    async fn accept(&mut self, batch: Vec<EmbeddedChunk>) -> Result<()> {
        let outcome = self.indexer.upsert_chunks(&batch).await?;
        self.vectors_upserted += outcome.upserted;
        for (path, (namespace, ids)) in outcome.ids_by_file {
            self.manifest.record_file(&path, namespace, ids);
        }
        self.manifest.save(self.manifest_path)?;
        Ok(())
    }
}
