//! Persisted index manifest: the diff watermark plus a per-file record of the
//! vector ids currently stored, enabling exact deletion on incremental runs.
//!
//! The vector store remains the system of record for vectors; this file only
//! mirrors which ids were written for which source path.

use crate::vector_store::Namespace;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Vector ids stored for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVectors {
    pub namespace: Namespace,
    pub ids: Vec<String>,
}

/// Durable state of the last indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Commit hash of the last fully successful indexing run
    #[serde(default)]
    pub last_commit: Option<String>,

    /// Map of source path -> vectors currently stored for it
    #[serde(default)]
    pub files: BTreeMap<String, FileVectors>,
}

impl IndexManifest {
    /// Load the manifest from disk, starting empty when none exists
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("manifest not found at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest at {}", path.display()))?;
        let manifest: IndexManifest =
            serde_json::from_str(&content).context("failed to parse manifest")?;

        tracing::debug!(
            "loaded manifest tracking {} files ({} vectors)",
            manifest.files.len(),
            manifest.total_vectors()
        );
        Ok(manifest)
    }

    /// Save the manifest to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create manifest directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write manifest to {}", path.display()))?;

        tracing::debug!("saved manifest to {}", path.display());
        Ok(())
    }

    /// Record vector ids written for a file, deduplicating repeats
    pub fn record_file(&mut self, path: &str, namespace: Namespace, ids: Vec<String>) {
        let entry = self
            .files
            .entry(path.to_string())
            .or_insert_with(|| FileVectors {
                namespace,
                ids: Vec::new(),
            });
        entry.namespace = namespace;
        for id in ids {
            if !entry.ids.contains(&id) {
                entry.ids.push(id);
            }
        }
    }

    /// Forget a file, returning the ids that were stored for it
    pub fn remove_file(&mut self, path: &str) -> Option<FileVectors> {
        self.files.remove(path)
    }

    /// Drop every tracked file (full reindex)
    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    pub fn total_vectors(&self) -> usize {
        self.files.values().map(|entry| entry.ids.len()).sum()
    }

    /// Default manifest location in the platform cache directory
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repo-index")
            .join("manifest.json")
    }
}
