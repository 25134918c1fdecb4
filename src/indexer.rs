//! Store-facing side of the pipeline: deterministic ids, namespace grouping,
//! bounded-batch upserts, and manifest-driven deletion.

use crate::embedding::EmbeddedChunk;
use crate::manifest::IndexManifest;
use crate::types::ChunkMetadata;
use crate::vector_store::{Namespace, VectorRecord, VectorStore};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

pub struct Indexer {
    store: Arc<dyn VectorStore>,
    upsert_batch_size: usize,
}

/// Result of one upsert pass
#[derive(Debug, Default)]
pub struct UpsertOutcome {
    pub upserted: usize,
    /// Ids written per source file, for the manifest
    pub ids_by_file: HashMap<String, (Namespace, Vec<String>)>,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>, upsert_batch_size: usize) -> Self {
        Self {
            store,
            upsert_batch_size: upsert_batch_size.max(1),
        }
    }

    /// Stable vector identity derived from the chunk's position, not a per-run
    /// ordinal: the same chunk maps to the same id on every run, so re-indexing
    /// replaces instead of duplicating or orphaning entries.
    pub fn vector_id(metadata: &ChunkMetadata) -> String {
        let namespace = Namespace::for_language(&metadata.language);
        let mut hasher = Sha256::new();
        hasher.update(metadata.file_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(metadata.start_line.to_le_bytes());
        hasher.update(metadata.end_line.to_le_bytes());
        hasher.update(metadata.chunk_type.as_str().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        format!("{}:{}:{}", namespace, metadata.file_path, &digest[..12])
    }

    /// Group embedded chunks by namespace and upsert in bounded batches
    pub async fn upsert_chunks(&self, embedded: &[EmbeddedChunk]) -> Result<UpsertOutcome> {
        let mut by_namespace: HashMap<Namespace, Vec<VectorRecord>> = HashMap::new();
        let mut outcome = UpsertOutcome::default();

        for item in embedded {
            let metadata = item.chunk.metadata.clone();
            let namespace = Namespace::for_language(&metadata.language);
            let id = Self::vector_id(&metadata);

            outcome
                .ids_by_file
                .entry(metadata.file_path.clone())
                .or_insert_with(|| (namespace, Vec::new()))
                .1
                .push(id.clone());

            by_namespace.entry(namespace).or_default().push(VectorRecord {
                id,
                values: item.vector.clone(),
                metadata,
            });
        }

        for (namespace, records) in by_namespace {
            tracing::debug!(
                "upserting {} vectors into namespace {}",
                records.len(),
                namespace
            );
            for batch in records.chunks(self.upsert_batch_size) {
                let stored = self
                    .store
                    .upsert(namespace, batch.to_vec())
                    .await
                    .with_context(|| {
                        format!("failed to upsert batch into namespace {}", namespace)
                    })?;
                outcome.upserted += stored;
            }
        }

        Ok(outcome)
    }

    /// Remove every vector previously stored for a file, using the manifest's
    /// path -> ids record. A path with no recorded vectors is a no-op.
    pub async fn delete_file(&self, manifest: &mut IndexManifest, path: &str) -> Result<usize> {
        let Some(entry) = manifest.remove_file(path) else {
            tracing::debug!("no stored vectors recorded for {}", path);
            return Ok(0);
        };
        if entry.ids.is_empty() {
            return Ok(0);
        }

        self.store
            .delete_ids(entry.namespace, &entry.ids)
            .await
            .with_context(|| format!("failed to delete vectors for {}", path))?;

        tracing::info!("deleted {} vectors for {}", entry.ids.len(), path);
        Ok(entry.ids.len())
    }

    /// Clear both namespaces; used only for full reindex
    pub async fn clear_all(&self) -> Result<()> {
        for namespace in Namespace::ALL {
            self.store
                .delete_all(namespace)
                .await
                .with_context(|| format!("failed to clear namespace {}", namespace))?;
        }
        tracing::info!("cleared all vectors");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkKind};
    use crate::vector_store::MemoryVectorStore;

    fn metadata(path: &str, language: &str, start: usize, end: usize) -> ChunkMetadata {
        ChunkMetadata {
            file_path: path.to_string(),
            file_name: path.rsplit('/').next().unwrap().to_string(),
            language: language.to_string(),
            package: "root".to_string(),
            chunk_type: ChunkKind::Function,
            name: "f".to_string(),
            imports: vec![],
            exports: vec![],
            start_line: start,
            end_line: end,
            last_modified: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn embedded(path: &str, language: &str, start: usize, end: usize) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                content: "content".to_string(),
                metadata: metadata(path, language, start, end),
            },
            vector: vec![1.0, 0.0],
        }
    }

    #[test]
    fn test_vector_id_is_deterministic() {
        let a = Indexer::vector_id(&metadata("src/a.ts", "typescript", 1, 10));
        let b = Indexer::vector_id(&metadata("src/a.ts", "typescript", 1, 10));
        assert_eq!(a, b);
        assert!(a.starts_with("code:src/a.ts:"));
    }

    #[test]
    fn test_vector_id_changes_with_position() {
        let base = Indexer::vector_id(&metadata("src/a.ts", "typescript", 1, 10));
        let moved = Indexer::vector_id(&metadata("src/a.ts", "typescript", 2, 10));
        let other_file = Indexer::vector_id(&metadata("src/b.ts", "typescript", 1, 10));
        assert_ne!(base, moved);
        assert_ne!(base, other_file);
    }

    #[test]
    fn test_vector_id_namespace_prefix_follows_language() {
        let docs = Indexer::vector_id(&metadata("docs/a.md", "markdown", 1, 5));
        assert!(docs.starts_with("docs:docs/a.md:"));
    }

    #[tokio::test]
    async fn test_upsert_groups_by_namespace() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::new(store.clone(), 100);

        let outcome = indexer
            .upsert_chunks(&[
                embedded("src/a.ts", "typescript", 1, 5),
                embedded("src/a.ts", "typescript", 6, 9),
                embedded("docs/guide.md", "markdown", 1, 4),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.upserted, 3);
        assert_eq!(store.count(Namespace::Code), 2);
        assert_eq!(store.count(Namespace::Docs), 1);

        let (namespace, ids) = outcome.ids_by_file.get("src/a.ts").unwrap();
        assert_eq!(*namespace, Namespace::Code);
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_respects_batch_size() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::new(store.clone(), 2);

        let chunks: Vec<EmbeddedChunk> = (0..5)
            .map(|i| embedded("src/a.ts", "typescript", i * 10 + 1, i * 10 + 5))
            .collect();
        let outcome = indexer.upsert_chunks(&chunks).await.unwrap();

        assert_eq!(outcome.upserted, 5);
        assert_eq!(store.count(Namespace::Code), 5);
    }

    #[tokio::test]
    async fn test_delete_file_removes_recorded_vectors() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::new(store.clone(), 100);
        let mut manifest = IndexManifest::default();

        let outcome = indexer
            .upsert_chunks(&[
                embedded("src/a.ts", "typescript", 1, 5),
                embedded("src/b.ts", "typescript", 1, 5),
            ])
            .await
            .unwrap();
        for (path, (namespace, ids)) in outcome.ids_by_file {
            manifest.record_file(&path, namespace, ids);
        }

        let deleted = indexer.delete_file(&mut manifest, "src/a.ts").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count(Namespace::Code), 1);
        assert!(manifest.files.get("src/a.ts").is_none());

        // pruning a path that was never indexed is a quiet no-op
        let deleted = indexer.delete_file(&mut manifest, "src/new.ts").await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_namespaces() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::new(store.clone(), 100);

        indexer
            .upsert_chunks(&[
                embedded("src/a.ts", "typescript", 1, 5),
                embedded("docs/guide.md", "markdown", 1, 4),
            ])
            .await
            .unwrap();
        indexer.clear_all().await.unwrap();

        assert_eq!(store.total(), 0);
    }
}
