/// End-to-end pipeline tests against the in-memory vector store.
use anyhow::Result;
use repo_index::config::Config;
use repo_index::embedding::{EmbeddingProvider, EmbeddingTask};
use repo_index::manifest::IndexManifest;
use repo_index::pipeline::Pipeline;
use repo_index::types::IndexMode;
use repo_index::vector_store::{MemoryVectorStore, Namespace};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Deterministic embedder that records every call
struct FakeEmbedder {
    calls: Mutex<Vec<(String, EmbeddingTask, tokio::time::Instant)>>,
}

impl FakeEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _, _)| text.clone())
            .collect()
    }

    fn distinct_call_times(&self) -> Vec<tokio::time::Instant> {
        let mut times: Vec<_> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, at)| *at)
            .collect();
        times.sort();
        times.dedup();
        times
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), task, tokio::time::Instant::now()));
        let sum: u32 = text.bytes().map(u32::from).sum();
        Ok(vec![text.len() as f32, sum as f32, 1.0])
    }

    fn dimension(&self) -> usize {
        3
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Two exported functions -> two code chunks
const LIB_TS: &str = "export function first(): number {\n  return 1;\n}\n\nexport function second(): number {\n  return 2;\n}\n";

/// One h1 section spanning the file plus one h2 section -> two docs chunks
const GUIDE_MD: &str = "# Guide\n\nIntro.\n\n## Setup\n\nSteps.\n";

/// One section -> one docs chunk
const README_MD: &str = "# Project\n\nHello.\n";

fn write_tree(root: &Path) {
    write(root, "packages/core/src/lib.ts", LIB_TS);
    write(root, "docs/guide.md", GUIDE_MD);
    write(root, "README.md", README_MD);
}

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .expect("git is available");
    assert!(status.success(), "git {:?} failed", args);
}

fn git_init(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test"]);
}

fn git_commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

struct Harness {
    repo: TempDir,
    state: TempDir,
    provider: Arc<FakeEmbedder>,
    store: Arc<MemoryVectorStore>,
}

impl Harness {
    fn new() -> Self {
        let repo = TempDir::new().unwrap();
        write_tree(repo.path());
        Self {
            repo,
            state: TempDir::new().unwrap(),
            provider: FakeEmbedder::new(),
            store: Arc::new(MemoryVectorStore::new()),
        }
    }

    fn pipeline(&self) -> Pipeline {
        self.pipeline_with_config(Config::default())
    }

    fn pipeline_with_config(&self, config: Config) -> Pipeline {
        Pipeline::new(
            self.repo.path().to_path_buf(),
            config,
            self.provider.clone(),
            self.store.clone(),
        )
        .with_manifest_path(self.state.path().join("manifest.json"))
    }
}

#[tokio::test]
async fn test_full_index_populates_both_namespaces() {
    let harness = Harness::new();

    let report = harness.pipeline().run(IndexMode::Full).await.unwrap();

    assert_eq!(report.mode, IndexMode::Full);
    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_indexed, 3);
    assert_eq!(report.chunks_created, 5);
    assert_eq!(report.embeddings_generated, 5);
    assert_eq!(report.vectors_upserted, 5);

    assert_eq!(harness.store.count(Namespace::Code), 2);
    assert_eq!(harness.store.count(Namespace::Docs), 3);
}

#[tokio::test]
async fn test_full_reindex_is_idempotent() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();

    let first = pipeline.run(IndexMode::Full).await.unwrap();
    let total_after_first = harness.store.total();
    let code_ids_after_first = harness.store.ids(Namespace::Code);

    let second = pipeline.run(IndexMode::Full).await.unwrap();
    let total_after_second = harness.store.total();

    assert!(total_after_first > 0);
    assert_eq!(total_after_first, total_after_second);
    assert_eq!(first.vectors_upserted, second.vectors_upserted);
    // deterministic ids: the second run wrote the exact same id set
    assert_eq!(code_ids_after_first, harness.store.ids(Namespace::Code));
}

#[tokio::test]
async fn test_incremental_without_watermark_falls_back_to_full() {
    let harness = Harness::new();

    // no git repository, no recorded revision
    let report = harness
        .pipeline()
        .run(IndexMode::Incremental)
        .await
        .unwrap();

    assert_eq!(report.mode, IndexMode::Full);
    assert_eq!(harness.store.total(), 5);
}

#[tokio::test]
async fn test_incremental_with_broken_git_falls_back_to_full() {
    let harness = Harness::new();

    // a watermark pointing nowhere: the git call fails, the run must degrade
    // to a full reindex rather than error out
    let manifest_path = harness.state.path().join("manifest.json");
    let mut manifest = IndexManifest::default();
    manifest.last_commit = Some("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef".to_string());
    manifest.save(&manifest_path).unwrap();

    let report = harness
        .pipeline()
        .run(IndexMode::Incremental)
        .await
        .unwrap();

    assert_eq!(report.mode, IndexMode::Full);
    assert_eq!(harness.store.total(), 5);
}

#[tokio::test]
async fn test_incremental_with_clean_tree_is_a_noop() {
    let harness = Harness::new();
    git_init(harness.repo.path());
    git_commit_all(harness.repo.path(), "initial");

    let pipeline = harness.pipeline();
    pipeline.run(IndexMode::Full).await.unwrap();
    let calls_after_full = harness.provider.call_count();

    let report = pipeline.run(IndexMode::Incremental).await.unwrap();

    assert_eq!(report.mode, IndexMode::Incremental);
    assert_eq!(report.files_indexed, 0);
    assert_eq!(report.chunks_created, 0);
    assert_eq!(report.vectors_upserted, 0);
    assert_eq!(harness.provider.call_count(), calls_after_full);
    assert_eq!(harness.store.total(), 5);
}

#[tokio::test]
async fn test_incremental_prunes_and_reindexes_only_changed_files() {
    let harness = Harness::new();
    git_init(harness.repo.path());
    git_commit_all(harness.repo.path(), "initial");

    let pipeline = harness.pipeline();
    pipeline.run(IndexMode::Full).await.unwrap();
    let calls_after_full = harness.provider.call_count();

    // modify a source file (now three functions), delete a doc, add a doc
    write(
        harness.repo.path(),
        "packages/core/src/lib.ts",
        "export function first(): number {\n  return 1;\n}\n\nexport function second(): number {\n  return 2;\n}\n\nexport function third(): number {\n  return 3;\n}\n",
    );
    std::fs::remove_file(harness.repo.path().join("docs/guide.md")).unwrap();
    write(harness.repo.path(), "docs/new.md", "# New\n\nFresh.\n");
    git_commit_all(harness.repo.path(), "changes");

    let report = pipeline.run(IndexMode::Incremental).await.unwrap();

    assert_eq!(report.mode, IndexMode::Incremental);
    // only lib.ts (modified) and new.md (added) are re-indexed
    assert_eq!(report.files_indexed, 2);
    assert_eq!(report.chunks_created, 4);
    // stale vectors were pruned for the modified file and the deleted file
    assert_eq!(report.files_pruned, 2);
    assert_eq!(report.vectors_deleted, 4);

    // the deleted doc is gone from the store
    assert!(
        harness
            .store
            .ids(Namespace::Docs)
            .iter()
            .all(|id| !id.contains("docs/guide.md"))
    );

    // final state: 3 code chunks, README + new.md in docs
    assert_eq!(harness.store.count(Namespace::Code), 3);
    assert_eq!(harness.store.count(Namespace::Docs), 2);

    // unchanged files were not re-embedded
    let second_run_texts: Vec<String> = harness
        .provider
        .texts()
        .split_off(calls_after_full);
    assert_eq!(second_run_texts.len(), 4);
    assert!(second_run_texts.iter().all(|text| !text.contains("Hello.")));
}

#[tokio::test]
async fn test_deleted_only_change_prunes_without_embedding() {
    let harness = Harness::new();
    git_init(harness.repo.path());
    git_commit_all(harness.repo.path(), "initial");

    let pipeline = harness.pipeline();
    pipeline.run(IndexMode::Full).await.unwrap();
    let calls_after_full = harness.provider.call_count();

    std::fs::remove_file(harness.repo.path().join("docs/guide.md")).unwrap();
    git_commit_all(harness.repo.path(), "remove guide");

    let report = pipeline.run(IndexMode::Incremental).await.unwrap();

    assert_eq!(report.files_indexed, 0);
    assert_eq!(report.files_pruned, 1);
    assert_eq!(report.vectors_deleted, 2);
    assert_eq!(harness.provider.call_count(), calls_after_full);
    assert_eq!(harness.store.count(Namespace::Docs), 1);
}

#[tokio::test(start_paused = true)]
async fn test_embedding_batches_are_rate_limited() {
    let harness = Harness::new();
    // ten markdown sections: one h1 spanning the file plus nine h2 sections
    let mut long_doc = String::from("# Long\n\n");
    for section in 1..=9 {
        long_doc.push_str(&format!("## Section {}\n\ntext\n\n", section));
    }
    write(harness.repo.path(), "docs/long.md", &long_doc);

    let mut config = Config::default();
    config.embedding.batch_size = 4;
    config.embedding.rate_limit_ms = 100;
    let pipeline = harness.pipeline_with_config(config);

    let started = tokio::time::Instant::now();
    let report = pipeline.run(IndexMode::Full).await.unwrap();

    // 5 tree chunks + 10 long.md chunks = 15 -> ceil(15 / 4) = 4 batches
    assert_eq!(report.chunks_created, 15);
    let batches = harness.provider.distinct_call_times().len();
    assert_eq!(batches, 4);
    // the delay elapsed exactly batches - 1 times
    assert_eq!(
        started.elapsed(),
        std::time::Duration::from_millis(300)
    );
}

#[tokio::test]
async fn test_manifest_watermark_advances_after_successful_run() {
    let harness = Harness::new();
    git_init(harness.repo.path());
    git_commit_all(harness.repo.path(), "initial");

    let manifest_path = harness.state.path().join("manifest.json");
    harness.pipeline().run(IndexMode::Full).await.unwrap();

    let manifest = IndexManifest::load(&manifest_path).unwrap();
    let head = manifest.last_commit.clone().expect("watermark recorded");
    assert_eq!(head.len(), 40);

    // the manifest mirrors exactly what the store holds
    assert_eq!(manifest.total_vectors(), harness.store.total());
    assert_eq!(manifest.files.len(), 3);
}
