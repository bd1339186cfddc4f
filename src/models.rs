//! Core data types flowing through the chunking and indexing pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single documentation page discovered on disk.
///
/// Immutable once read: `url` and `doc_type` are derived from `filepath`
/// at scan time and never change afterwards.
#[derive(Debug, Clone)]
pub struct Page {
    /// Path of the rendered HTML file.
    pub filepath: PathBuf,
    /// Public URL of the page, derived from the path relative to the docs root.
    pub url: String,
    /// Coarse classification drawn from the configured vocabulary,
    /// `None` when no vocabulary entry matches the path.
    pub doc_type: Option<String>,
}

/// Chunk classification: prose or source listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Text,
    Code,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Text => "text",
            ChunkKind::Code => "code",
        }
    }

    /// Parse a CLI-supplied kind name.
    pub fn parse(s: &str) -> Option<ChunkKind> {
        match s {
            "text" => Some(ChunkKind::Text),
            "code" => Some(ChunkKind::Code),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The atomic indexable unit: a validated span of prose or code,
/// tagged with the anchor of the section it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub kind: ChunkKind,
    pub anchor: String,
}

/// A ranked hit returned from the vector index.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Page URL including the `#anchor` fragment.
    pub url: String,
    pub content: String,
    pub kind: ChunkKind,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChunkKind::Text).unwrap(), "\"text\"");
        assert_eq!(serde_json::to_string(&ChunkKind::Code).unwrap(), "\"code\"");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ChunkKind::parse("text"), Some(ChunkKind::Text));
        assert_eq!(ChunkKind::parse("code"), Some(ChunkKind::Code));
        assert_eq!(ChunkKind::parse("prose"), None);
    }
}
