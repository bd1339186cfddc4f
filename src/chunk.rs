//! Chunk extraction: sections in, embeddable chunks out.
//!
//! A section body alternates prose and fenced code. Prose is flattened
//! to single-line text and, when oversized, segmented at whitespace
//! boundaries into bounded pieces; code is kept verbatim and never
//! subdivided. [`page_to_chunks`] composes the whole pipeline for one
//! rendered page.

use crate::models::{Chunk, ChunkKind};
use crate::normalize::{is_language_token, normalize};
use crate::sections::split_into_sections;
use crate::validate::{is_valid, ValidationRules};

/// Size bounds injected from `[chunking]` configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChunkLimits {
    /// Prose chunks never exceed this many characters.
    pub max_chunk_chars: usize,
}

/// An unvalidated chunk candidate within a single section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionChunk {
    pub kind: ChunkKind,
    pub content: String,
}

/// Splits one section body into interleaved text and code candidates,
/// preserving document order.
pub fn split_section(section: &str, limits: &ChunkLimits) -> Vec<SectionChunk> {
    let mut out = Vec::new();

    for (i, part) in section.split("```").enumerate() {
        if i % 2 == 0 {
            let flat = flatten_prose(part);
            if flat.is_empty() {
                continue;
            }
            for piece in segment_prose(&flat, limits.max_chunk_chars) {
                out.push(SectionChunk {
                    kind: ChunkKind::Text,
                    content: piece,
                });
            }
        } else {
            let code = strip_code_frame(part);
            if code.trim().is_empty() {
                continue;
            }
            out.push(SectionChunk {
                kind: ChunkKind::Code,
                content: code,
            });
        }
    }
    out
}

/// The full pipeline for one page: normalize, split into sections,
/// extract candidates, validate. Total: malformed input yields an
/// empty list, never an error.
pub fn page_to_chunks(markdown: &str, limits: &ChunkLimits, rules: &ValidationRules) -> Vec<Chunk> {
    let normalized = normalize(markdown);
    let mut chunks = Vec::new();

    for (anchor, body) in split_into_sections(&normalized) {
        for candidate in split_section(&body, limits) {
            if is_valid(&candidate.content, rules) {
                chunks.push(Chunk {
                    content: candidate.content,
                    kind: candidate.kind,
                    anchor: anchor.clone(),
                });
            }
        }
    }
    chunks
}

/// Flattens a prose span: trim, drop table pipes when the span is a
/// table row dump, then fold newlines into spaces.
fn flatten_prose(part: &str) -> String {
    let mut text = part.trim().to_string();
    if text.starts_with('|') && text.ends_with('|') {
        text = text.replace('|', "").trim().to_string();
    }
    text.replace('\n', " ")
}

/// Strips the language tag line and surrounding blank lines from a
/// fenced span, leaving the code itself byte-for-byte intact.
fn strip_code_frame(part: &str) -> String {
    let body = match part.split_once('\n') {
        Some((first, rest)) if is_language_token(first) => rest,
        _ => part,
    };
    body.trim_matches(['\n', '\r']).to_string()
}

/// Greedy in-order segmentation of flattened prose into pieces of at
/// most `max` characters whose concatenation reproduces `text` exactly.
///
/// The piece count is fixed up front at the minimum needed, and each
/// piece targets an even share of what remains so no final sliver is
/// produced. Cuts prefer the last space at or before the target; a
/// space-free stretch is cut at the target character boundary.
fn segment_prose(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let total = text.chars().count();
    if total <= max {
        return vec![text.to_string()];
    }

    let pieces = total.div_ceil(max);
    let mut out = Vec::with_capacity(pieces);
    let mut rest = text;
    let mut remaining = total;

    for left in (2..=pieces).rev() {
        let target = remaining.div_ceil(left).min(max);
        // Anything shorter than this leaves more than the remaining
        // pieces can hold.
        let floor = remaining.saturating_sub((left - 1) * max);
        let cut = cut_point(rest, floor, target);
        let (piece, tail) = rest.split_at(cut);
        out.push(piece.to_string());
        remaining -= piece.chars().count();
        rest = tail;
    }
    out.push(rest.to_string());
    out
}

/// Byte offset of the best cut: just after the last space yielding a
/// piece of at least `floor` and at most `target` characters, or the
/// `target` character boundary when no such space exists.
fn cut_point(text: &str, floor: usize, target: usize) -> usize {
    let mut limit = text.len();
    let mut best: Option<usize> = None;

    for (chars, (offset, c)) in text.char_indices().enumerate() {
        if chars == target {
            limit = offset;
            break;
        }
        if c == ' ' && chars + 1 >= floor {
            best = Some(offset + 1);
        }
    }
    best.unwrap_or(limit)
}
