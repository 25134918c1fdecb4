//! Heading-based splitter for markdown documents.
//!
//! Headings up to depth 3 start sections; a section runs until the next
//! heading of equal-or-higher level, so subsections are covered both by their
//! parent section and by their own chunk. Content before the first heading is
//! attributed to the file itself.

use super::SharedMetadata;
use crate::types::{Chunk, ChunkKind};
use regex::Regex;
use std::sync::OnceLock;

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("heading pattern is valid"))
}

struct Heading {
    line_idx: usize,
    level: usize,
    title: String,
}

pub(crate) fn split_markdown(content: &str, shared: &SharedMetadata) -> Vec<Chunk> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let headings: Vec<Heading> = lines
        .iter()
        .enumerate()
        .filter_map(|(line_idx, line)| {
            heading_pattern().captures(line).map(|caps| Heading {
                line_idx,
                level: caps[1].len(),
                title: caps[2].trim().to_string(),
            })
        })
        .collect();

    let mut chunks = Vec::new();

    // leading content before any heading belongs to the file itself
    let preamble_end = headings.first().map_or(lines.len(), |h| h.line_idx);
    if preamble_end > 0 {
        let preamble = lines[..preamble_end].join("\n");
        if !preamble.trim().is_empty() {
            chunks.push(shared.chunk(
                preamble,
                ChunkKind::Section,
                shared.file_name.clone(),
                Vec::new(),
                Vec::new(),
                1,
                preamble_end,
            ));
        }
    }

    for (position, heading) in headings.iter().enumerate() {
        // the section body runs until the next heading of equal-or-higher level
        let end_idx = headings[position + 1..]
            .iter()
            .find(|next| next.level <= heading.level)
            .map_or(lines.len(), |next| next.line_idx);

        chunks.push(shared.chunk(
            lines[heading.line_idx..end_idx].join("\n"),
            ChunkKind::Section,
            heading.title.clone(),
            Vec::new(),
            Vec::new(),
            heading.line_idx + 1,
            end_idx,
        ));
    }

    chunks
}
