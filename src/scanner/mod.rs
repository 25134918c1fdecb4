//! File discovery: gitignore-aware directory walking filtered by include and
//! exclude glob patterns.

mod git_diff;

pub use git_diff::{GitDiffDetector, INDEXABLE_EXTENSIONS, parse_name_status};

use crate::config::ScannerConfig;
use crate::types::FileInfo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct FileScanner {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    max_file_size: u64,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, config: &ScannerConfig) -> Result<Self> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            include: build_globset(&config.include_patterns)?,
            exclude: build_globset(&config.exclude_patterns)?,
            max_file_size: config.max_file_size,
        })
    }

    /// Walk the root and collect all eligible files, sorted by path
    pub fn scan(&self) -> Result<Vec<FileInfo>> {
        if !self.root.exists() {
            anyhow::bail!("root directory does not exist: {:?}", self.root);
        }
        if !self.root.is_dir() {
            anyhow::bail!("root path is not a directory: {:?}", self.root);
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true) // Respect .gitignore, .ignore, etc.
            .hidden(false) // Don't skip hidden files by default
            .git_ignore(true) // Respect .gitignore files
            .git_exclude(true) // Respect .git/info/exclude
            .git_global(true) // Respect global gitignore
            .require_git(false) // Don't require a .git directory
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!("skipping unreadable entry: {}", error);
                    continue;
                }
            };
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            // Explicitly skip .git directory contents
            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().to_string();

            if !self.include.is_match(relative.as_str()) {
                continue;
            }
            if self.exclude.is_match(relative.as_str()) {
                tracing::debug!("excluded: {}", relative);
                continue;
            }

            // A single file failing to stat is never fatal to the scan
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) => {
                    tracing::warn!("failed to stat {}: {}", relative, error);
                    continue;
                }
            };

            if metadata.len() > self.max_file_size {
                tracing::debug!("skipping large file: {}", relative);
                continue;
            }

            let last_modified = match metadata.modified() {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(error) => {
                    tracing::warn!("failed to read mtime for {}: {}", relative, error);
                    continue;
                }
            };

            files.push(FileInfo {
                path: relative,
                size: metadata.len(),
                last_modified,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!("found {} files to index", files.len());
        Ok(files)
    }
}

/// Compile patterns into a set; `*` never crosses `/`
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern '{}'", pattern))?;
        builder.add(glob);
    }
    builder.build().context("failed to compile glob patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan_paths(root: &Path, config: &ScannerConfig) -> Vec<String> {
        let scanner = FileScanner::new(root, config).unwrap();
        scanner.scan().unwrap().into_iter().map(|f| f.path).collect()
    }

    #[test]
    fn test_scan_selects_included_files_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "packages/db/src/schema.ts", "export const x = 1;\n");
        write(dir.path(), "apps/web/src/main.tsx", "export const y = 2;\n");
        write(dir.path(), "docs/guide.md", "# Guide\n");
        write(dir.path(), "README.md", "# Readme\n");
        write(dir.path(), "scripts/run.sh", "echo hi\n");
        write(dir.path(), "packages/db/src/notes.txt", "notes\n");

        let paths = scan_paths(dir.path(), &ScannerConfig::default());
        assert_eq!(
            paths,
            vec![
                "README.md",
                "apps/web/src/main.tsx",
                "docs/guide.md",
                "packages/db/src/schema.ts",
            ]
        );
    }

    #[test]
    fn test_scan_applies_exclusions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "packages/web/src/index.ts", "export const a = 1;\n");
        write(dir.path(), "packages/web/dist/index.js", "var a = 1;\n");
        write(dir.path(), "packages/db/src/types.gen.ts", "// generated\n");
        write(dir.path(), "node_modules/pkg/index.js", "module.exports = 1;\n");

        let paths = scan_paths(dir.path(), &ScannerConfig::default());
        assert_eq!(paths, vec!["packages/web/src/index.ts"]);
    }

    #[test]
    fn test_root_level_markdown_glob_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "CHANGELOG.md", "# Changelog\n");
        write(dir.path(), "notes/inner.md", "# Inner\n");

        let paths = scan_paths(dir.path(), &ScannerConfig::default());
        assert_eq!(paths, vec!["CHANGELOG.md"]);
    }

    #[test]
    fn test_scan_skips_files_over_size_cap() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/big.md", &"x".repeat(64));
        write(dir.path(), "docs/small.md", "# ok\n");

        let config = ScannerConfig {
            max_file_size: 32,
            ..ScannerConfig::default()
        };
        let paths = scan_paths(dir.path(), &config);
        assert_eq!(paths, vec!["docs/small.md"]);
    }

    #[test]
    fn test_scan_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "docs/generated/\n");
        write(dir.path(), "docs/guide.md", "# Guide\n");
        write(dir.path(), "docs/generated/api.md", "# Api\n");

        let paths = scan_paths(dir.path(), &ScannerConfig::default());
        assert_eq!(paths, vec!["docs/guide.md"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let config = ScannerConfig::default();
        let scanner = FileScanner::new("/nonexistent/root/dir", &config).unwrap();
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_file_info_carries_size_and_mtime() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Readme\n");

        let scanner = FileScanner::new(dir.path(), &ScannerConfig::default()).unwrap();
        let files = scanner.scan().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 9);
        assert!(files[0].last_modified.timestamp() > 0);
    }
}
