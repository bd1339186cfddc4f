//! Chunk candidate validation: a pure noise filter.
//!
//! The earlier passes keep transformation and filtering separate; this
//! is the single place a candidate can be rejected. Rejection is a
//! silent drop, never a repair.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{ChunkingConfig, ValidationConfig};

static FOOTNOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]:").unwrap());

/// Thresholds and markers injected from configuration.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    /// Trimmed candidates must be strictly longer than this.
    pub min_chars: usize,
    /// Script/DOM boilerplate substrings that disqualify a candidate.
    pub denylist: Vec<String>,
    /// Math-rendering leakage marker.
    pub mathjax_marker: String,
}

impl ValidationRules {
    pub fn from_config(chunking: &ChunkingConfig, validation: &ValidationConfig) -> Self {
        Self {
            min_chars: chunking.min_chunk_chars,
            denylist: validation.denylist.clone(),
            mathjax_marker: validation.mathjax_marker.clone(),
        }
    }

    #[cfg(test)]
    pub fn defaults_for_tests() -> Self {
        Self::from_config(&ChunkingConfig::default(), &ValidationConfig::default())
    }
}

/// Decides whether a candidate chunk carries real content. Pure: no
/// I/O, no logging, same answer for the same input and rules.
pub fn is_valid(candidate: &str, rules: &ValidationRules) -> bool {
    let trimmed = candidate.trim();

    if trimmed.chars().count() <= rules.min_chars {
        return false;
    }
    if trimmed == "Note" {
        return false;
    }
    if FOOTNOTE_RE.is_match(trimmed) {
        return false;
    }
    if trimmed
        .chars()
        .all(|c| matches!(c, ' ' | '*' | '+' | '|' | '\n'))
    {
        return false;
    }
    if rules.denylist.iter().any(|s| candidate.contains(s)) {
        return false;
    }
    if candidate.contains(&rules.mathjax_marker) {
        return false;
    }
    true
}
