//! Fixed-size sliding-window splitter for files without structure.
//!
//! Lines accumulate until the character threshold is reached; the next chunk
//! re-includes a proportional number of trailing lines as overlap. Boundaries
//! never split mid-line and the union of emitted ranges covers every line.

use super::SharedMetadata;
use crate::types::{Chunk, ChunkKind};

pub(crate) fn split_fixed(
    content: &str,
    shared: &SharedMetadata,
    chunk_size: usize,
    overlap: usize,
) -> Vec<Chunk> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 1usize; // 1-based first line of the pending chunk
    let mut pending_len = 0usize;
    let mut last_emitted_end = 0usize;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        pending_len += line.len() + 1;

        if pending_len >= chunk_size {
            chunks.push(make_chunk(&lines, shared, start, line_no));
            last_emitted_end = line_no;

            // proportional trailing overlap, expressed in lines
            let span = line_no - start + 1;
            let overlap_lines = overlap.saturating_mul(span) / chunk_size;
            start = (line_no + 1).saturating_sub(overlap_lines).max(start);
            pending_len = lines[start - 1..line_no]
                .iter()
                .map(|l| l.len() + 1)
                .sum();
        }
    }

    // final partial chunk, whenever lines remain beyond the last emission
    if last_emitted_end < lines.len() {
        let tail = lines[start - 1..].join("\n");
        if !tail.trim().is_empty() {
            chunks.push(make_chunk(&lines, shared, start, lines.len()));
        }
    }

    chunks
}

fn make_chunk(lines: &[&str], shared: &SharedMetadata, start: usize, end: usize) -> Chunk {
    shared.chunk(
        lines[start - 1..end].join("\n"),
        ChunkKind::File,
        String::new(),
        Vec::new(),
        Vec::new(),
        start,
        end,
    )
}
