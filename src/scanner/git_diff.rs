//! Change detection against the recorded watermark revision.
//!
//! Shells out to `git diff --name-status` and classifies the tab-separated
//! status lines. The watermark itself is resolved through git2 so repository
//! discovery walks up from the scanned root the same way git does.

use crate::error::GitError;
use crate::types::GitDiffResult;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Extensions the pipeline knows how to chunk; diff entries outside this set
/// are ignored.
pub const INDEXABLE_EXTENSIONS: [&str; 5] = [".ts", ".tsx", ".js", ".jsx", ".md"];

pub struct GitDiffDetector {
    root: PathBuf,
}

impl GitDiffDetector {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve the current HEAD commit hash
    pub fn head_commit(&self) -> Result<String> {
        let repo = git2::Repository::discover(&self.root).map_err(|e| {
            GitError::NotARepository(format!("{}: {}", self.root.display(), e.message()))
        })?;
        let head = repo.head().context("failed to resolve HEAD")?;
        let commit = head
            .peel_to_commit()
            .context("HEAD does not point at a commit")?;
        Ok(commit.id().to_string())
    }

    /// Diff the working tree against `since` and classify the result
    pub async fn changed_since(&self, since: &str) -> Result<GitDiffResult> {
        tracing::debug!("running git diff --name-status {}", since);

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .arg("diff")
            .arg("--name-status")
            .arg(since)
            .output()
            .await
            .context("failed to invoke git")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = parse_name_status(&stdout);
        tracing::info!(
            "detected {} changed files ({} added, {} modified, {} deleted)",
            result.total(),
            result.added.len(),
            result.modified.len(),
            result.deleted.len()
        );
        Ok(result)
    }
}

/// Classify `git diff --name-status` output lines.
///
/// Renames and copies carry two paths; the new path (last field) is treated as
/// a modification. Paths with non-indexable extensions are dropped.
pub fn parse_name_status(output: &str) -> GitDiffResult {
    let mut result = GitDiffResult::default();

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let Some(status) = fields.next() else {
            continue;
        };
        let Some(path) = fields.last() else {
            continue;
        };

        if !is_indexable(path) {
            continue;
        }

        match status.chars().next() {
            Some('A') => result.added.push(path.to_string()),
            Some('M') => result.modified.push(path.to_string()),
            Some('D') => result.deleted.push(path.to_string()),
            Some('R') | Some('C') => result.modified.push(path.to_string()),
            _ => {}
        }
    }

    result
}

fn is_indexable(path: &str) -> bool {
    INDEXABLE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
