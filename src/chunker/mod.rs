//! File chunking: routes each file to a splitting strategy by extension.
//!
//! Markup goes through the heading splitter, source code through the
//! syntax-aware splitter (falling back to fixed-size slices when no top-level
//! declarations are found), and everything else straight to fixed-size
//! slices. Chunk boundaries always align to line boundaries.

mod ast;
mod fallback;
mod markdown;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkKind, ChunkMetadata, FileInfo};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Chunker {
    root: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(root: impl AsRef<Path>, config: &ChunkingConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Read a file from disk and chunk it
    pub fn chunk_file(&self, file: &FileInfo) -> Result<Vec<Chunk>> {
        let content = fs::read_to_string(self.root.join(&file.path))
            .with_context(|| format!("failed to read {}", file.path))?;
        Ok(self.chunk_content(file, &content))
    }

    /// Chunk already-loaded content
    pub fn chunk_content(&self, file: &FileInfo, content: &str) -> Vec<Chunk> {
        let shared = SharedMetadata::for_file(file);

        match extension(&file.path) {
            "md" => markdown::split_markdown(content, &shared),
            ext @ ("ts" | "tsx" | "js" | "jsx") => {
                let chunks = ast::split_source(content, ext, &shared);
                if chunks.is_empty() {
                    tracing::debug!(
                        "no top-level declarations in {}, using fixed-size chunking",
                        file.path
                    );
                    fallback::split_fixed(content, &shared, self.chunk_size, self.chunk_overlap)
                } else {
                    chunks
                }
            }
            _ => fallback::split_fixed(content, &shared, self.chunk_size, self.chunk_overlap),
        }
    }
}

/// Metadata fields shared by every chunk of one file
pub(crate) struct SharedMetadata {
    pub file_path: String,
    pub file_name: String,
    pub language: String,
    pub package: String,
    pub last_modified: String,
}

impl SharedMetadata {
    fn for_file(file: &FileInfo) -> Self {
        Self {
            file_path: file.path.clone(),
            file_name: file
                .path
                .rsplit('/')
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| file.path.clone()),
            language: detect_language(&file.path),
            package: detect_package(&file.path),
            last_modified: file.last_modified.to_rfc3339(),
        }
    }

    pub(crate) fn chunk(
        &self,
        content: String,
        chunk_type: ChunkKind,
        name: impl Into<String>,
        imports: Vec<String>,
        exports: Vec<String>,
        start_line: usize,
        end_line: usize,
    ) -> Chunk {
        Chunk {
            content,
            metadata: ChunkMetadata {
                file_path: self.file_path.clone(),
                file_name: self.file_name.clone(),
                language: self.language.clone(),
                package: self.package.clone(),
                chunk_type,
                name: name.into(),
                imports,
                exports,
                start_line,
                end_line,
                last_modified: self.last_modified.clone(),
            },
        }
    }
}

/// Detect language from the file extension
pub fn detect_language(path: &str) -> String {
    let language = match extension(path) {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "md" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        _ => "text",
    };
    language.to_string()
}

/// Determine monorepo package name from the file path
pub fn detect_package(path: &str) -> String {
    let mut parts = path.split('/');
    match (parts.next(), parts.next()) {
        (Some("apps"), Some(name)) | (Some("packages"), Some(name)) if !name.is_empty() => {
            name.to_string()
        }
        _ => "root".to_string(),
    }
}

fn extension(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

#[cfg(test)]
pub(crate) fn test_file_info(path: &str) -> FileInfo {
    FileInfo {
        path: path.to_string(),
        size: 0,
        last_modified: chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    }
}
