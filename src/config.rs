use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocsConfig {
    /// Directory containing the rendered HTML documentation tree.
    #[serde(default = "default_docs_root")]
    pub root: PathBuf,
    /// Public base URL the pages are served from.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Closed vocabulary of page classifications, matched against file paths.
    #[serde(default = "default_doc_types")]
    pub doc_types: Vec<String>,
}

fn default_docs_root() -> PathBuf {
    PathBuf::from("./docs/build/html")
}

fn default_base_url() -> String {
    "https://docs.example.com/".to_string()
}

fn default_doc_types() -> Vec<String> {
    [
        "cheat_sheets",
        "cli",
        "environments",
        "faq",
        "getting_started",
        "integrations",
        "plugins",
        "recipes",
        "teams",
        "tutorials",
        "user_guide",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: default_docs_root(),
            base_url: default_base_url(),
            doc_types: default_doc_types(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Validated chunks must be strictly longer than this, after trimming.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
    /// Prose chunks longer than this are segmented into bounded pieces.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

fn default_min_chunk_chars() -> usize {
    4
}

fn default_max_chunk_chars() -> usize {
    1000
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: default_min_chunk_chars(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Substrings that mark a candidate as leaked script/DOM boilerplate.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    /// Literal substring flagging math-rendering leakage.
    #[serde(default = "default_mathjax_marker")]
    pub mathjax_marker: String,
}

fn default_denylist() -> Vec<String> {
    [
        "(function() {",
        "@import url(",
        "position: relative;",
        "getElementById",
        "addEventListener",
        "eventList",
        "document.body",
        "the_modal",
        "window.dataLayer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_mathjax_marker() -> String {
    "MathJax".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            mathjax_marker: default_mathjax_marker(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Base URL of the Qdrant REST endpoint.
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Similarity metric for the collection (`Dot`, `Cosine`, `Euclid`).
    #[serde(default = "default_distance")]
    pub distance: String,
}

fn default_index_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "docs_chunks".to_string()
}

fn default_distance() -> String {
    "Dot".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            collection: default_collection(),
            distance: default_distance(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    /// Default path for `export`/`import` when none is given on the CLI.
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./docs_index.json")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

impl Config {
    /// A default configuration for tests and commands that can run
    /// without a config file on disk.
    pub fn minimal() -> Self {
        Self {
            docs: DocsConfig::default(),
            chunking: ChunkingConfig::default(),
            validation: ValidationConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_chunk_chars == 0 {
        anyhow::bail!("chunking.max_chunk_chars must be > 0");
    }

    if config.chunking.min_chunk_chars >= config.chunking.max_chunk_chars {
        anyhow::bail!("chunking.min_chunk_chars must be < chunking.max_chunk_chars");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    match config.index.distance.as_str() {
        "Dot" | "Cosine" | "Euclid" => {}
        other => anyhow::bail!(
            "Unknown index distance: '{}'. Must be Dot, Cosine, or Euclid.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let cfg = Config::minimal();
        assert_eq!(cfg.chunking.min_chunk_chars, 4);
        assert_eq!(cfg.chunking.max_chunk_chars, 1000);
        assert!(!cfg.embedding.is_enabled());
        assert!(cfg.docs.doc_types.contains(&"tutorials".to_string()));
        assert!(cfg
            .validation
            .denylist
            .contains(&"getElementById".to_string()));
    }

    #[test]
    fn test_empty_toml_parses_with_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.index.collection, "docs_chunks");
        assert_eq!(cfg.index.distance, "Dot");
    }
}
