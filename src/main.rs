use anyhow::Result;
use clap::Parser;
use repo_index::config::{Config, DotEnv};
use repo_index::embedding::GeminiEmbedder;
use repo_index::pipeline::Pipeline;
use repo_index::types::IndexMode;
use repo_index::vector_store::PineconeStore;
use std::sync::Arc;

/// Index the repository into the vector store
#[derive(Debug, Parser)]
#[command(name = "repo-index", version, about)]
struct Cli {
    /// Clear the store and re-embed every indexable file instead of the
    /// git-diff increment
    #[arg(long)]
    full: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let env = DotEnv::discover(std::env::current_dir()?);
    let config = Config::load(&env)?;

    let provider = Arc::new(GeminiEmbedder::new(&config.embedding)?);
    let store = Arc::new(PineconeStore::new(&config.store)?);

    let mode = if cli.full {
        IndexMode::Full
    } else {
        IndexMode::Incremental
    };

    let pipeline = Pipeline::new(env.root().to_path_buf(), config, provider, store);
    let report = pipeline.run(mode).await?;

    println!("Indexing complete ({})", report.mode);
    println!("  files scanned:   {}", report.files_scanned);
    println!("  files indexed:   {}", report.files_indexed);
    println!("  files pruned:    {}", report.files_pruned);
    println!("  chunks created:  {}", report.chunks_created);
    println!("  embeddings:      {}", report.embeddings_generated);
    println!("  vectors stored:  {}", report.vectors_upserted);
    println!(
        "  duration:        {:.2}s",
        report.duration_ms as f64 / 1000.0
    );

    Ok(())
}
