//! Batched embedding generation with rate limiting.
//!
//! Chunks are partitioned into fixed-size batches. Within one batch the
//! per-chunk calls are issued concurrently; between batches a fixed delay
//! elapses, never before the first batch or after the last. Each completed
//! batch is handed to a sink before the next batch starts, so a late failure
//! leaves earlier batches' work durable. Any single embedding failure aborts
//! the whole run.

use super::{EmbeddedChunk, EmbeddingProvider, EmbeddingTask};
use crate::types::Chunk;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Chunks embedded per batch
    pub batch_size: usize,
    /// Delay between consecutive batches
    pub rate_limit_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            rate_limit_delay: Duration::from_millis(100),
        }
    }
}

/// Receives each embedded batch as soon as it is complete
#[async_trait::async_trait]
pub trait BatchSink: Send {
    async fn accept(&mut self, batch: Vec<EmbeddedChunk>) -> Result<()>;
}

/// Embed one batch, issuing the per-chunk calls concurrently.
///
/// Results are keyed by chunk identity (position), so completion order within
/// the batch does not matter.
pub async fn embed_batch<P>(provider: &P, chunks: &[Chunk]) -> Result<Vec<EmbeddedChunk>>
where
    P: EmbeddingProvider + ?Sized,
{
    let futures = chunks.iter().map(|chunk| async move {
        let vector = provider
            .embed(&chunk.content, EmbeddingTask::Document)
            .await
            .with_context(|| format!("failed to embed chunk from {}", chunk.metadata.file_path))?;
        Ok::<EmbeddedChunk, anyhow::Error>(EmbeddedChunk {
            chunk: chunk.clone(),
            vector,
        })
    });
    futures::future::try_join_all(futures).await
}

/// Embed all chunks in rate-limited batches, feeding each batch to `sink`.
/// Returns the number of embeddings generated.
pub async fn embed_in_batches<P, S>(
    provider: &P,
    chunks: Vec<Chunk>,
    options: &BatchOptions,
    sink: &mut S,
) -> Result<usize>
where
    P: EmbeddingProvider + ?Sized,
    S: BatchSink + ?Sized,
{
    if chunks.is_empty() {
        return Ok(0);
    }
    anyhow::ensure!(options.batch_size > 0, "embedding batch size must be > 0");

    let total_batches = chunks.len().div_ceil(options.batch_size);
    let mut embedded_total = 0usize;

    for (index, batch) in chunks.chunks(options.batch_size).enumerate() {
        let embedded = embed_batch(provider, batch).await?;
        embedded_total += embedded.len();
        sink.accept(embedded).await?;

        tracing::info!(
            "embedded batch {}/{} ({} chunks so far)",
            index + 1,
            total_batches,
            embedded_total
        );

        if index + 1 < total_batches {
            tokio::time::sleep(options.rate_limit_delay).await;
        }
    }

    Ok(embedded_total)
}
