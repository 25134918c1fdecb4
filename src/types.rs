use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content a chunk was sliced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// A function declaration in a source file
    Function,
    /// A class declaration in a source file
    Class,
    /// An exported named value declaration (e.g. `export const handler = ...`)
    Export,
    /// A heading-delimited section of a markup document
    Section,
    /// A fixed-size slice with no semantic boundary
    File,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Function => "function",
            ChunkKind::Class => "class",
            ChunkKind::Export => "export",
            ChunkKind::Section => "section",
            ChunkKind::File => "file",
        }
    }
}

/// Metadata stored with each chunk
///
/// Serializes in camelCase because this struct is stored verbatim as vector
/// metadata and read back by the search tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// File path relative to the repository root
    pub file_path: String,
    /// File name without directories
    pub file_name: String,
    /// Language detected from the file extension
    pub language: String,
    /// Monorepo package the file belongs to (`apps/<x>`, `packages/<x>`, else `root`)
    pub package: String,
    /// What kind of unit this chunk covers
    pub chunk_type: ChunkKind,
    /// Declaration or section name; empty for fixed-size chunks
    pub name: String,
    /// File-level import module paths, in source order
    pub imports: Vec<String>,
    /// File-level exported symbol names, in source order
    pub exports: Vec<String>,
    /// Starting line number (1-based, inclusive)
    pub start_line: usize,
    /// Ending line number (1-based, inclusive)
    pub end_line: usize,
    /// RFC 3339 modification time of the source file
    pub last_modified: String,
}

/// A contiguous slice of a file's text plus descriptive metadata, the unit of
/// embedding and storage
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Information about a discovered file
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Path relative to the scanned root
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Filesystem modification time
    pub last_modified: DateTime<Utc>,
}

/// Classified output of a `git diff --name-status` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitDiffResult {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl GitDiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Paths that need re-indexing (added and modified)
    pub fn changed(&self) -> impl Iterator<Item = &String> {
        self.added.iter().chain(self.modified.iter())
    }

    /// Every path touched by the diff, including deletions
    pub fn all_paths(&self) -> impl Iterator<Item = &String> {
        self.added
            .iter()
            .chain(self.modified.iter())
            .chain(self.deleted.iter())
    }
}

/// Indexing mode selected by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Clear the store and re-embed every indexable file
    Full,
    /// Re-embed only files changed since the recorded watermark
    Incremental,
}

impl std::fmt::Display for IndexMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexMode::Full => write!(f, "full"),
            IndexMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Per-stage counts reported after a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub mode: IndexMode,
    pub files_scanned: usize,
    pub files_indexed: usize,
    /// Changed or deleted paths whose stored vectors were removed
    pub files_pruned: usize,
    pub chunks_created: usize,
    pub embeddings_generated: usize,
    pub vectors_upserted: usize,
    pub vectors_deleted: usize,
    pub duration_ms: u64,
}

impl IndexReport {
    pub fn new(mode: IndexMode) -> Self {
        Self {
            mode,
            files_scanned: 0,
            files_indexed: 0,
            files_pruned: 0,
            chunks_created: 0,
            embeddings_generated: 0,
            vectors_upserted: 0,
            vectors_deleted: 0,
            duration_ms: 0,
        }
    }
}
