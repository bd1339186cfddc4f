//! Query-side orchestration: embed the query and print ranked hits.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::embedding::Embedder;
use crate::index::{DocIndex, SearchFilter};
use crate::models::{ChunkKind, SearchHit};

const SNIPPET_CHARS: usize = 200;

/// Run a semantic search against the index and print the results.
pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: usize,
    doc_types: Vec<String>,
    kinds: Vec<String>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }
    if !config.embedding.is_enabled() {
        bail!("Search requires an embedding provider; set [embedding] provider = \"openai\"");
    }

    let kinds = parse_kinds(&kinds)?;
    for doc_type in &doc_types {
        if !config.docs.doc_types.contains(doc_type) {
            bail!(
                "Unknown doc type '{}'. Valid values: {}",
                doc_type,
                config.docs.doc_types.join(", ")
            );
        }
    }

    let embedder = Embedder::from_config(&config.embedding)?;
    let vector = embedder.embed_query(query).await?;
    let index = DocIndex::new(&config.index)?;
    let filter = SearchFilter { doc_types, kinds };
    let results = index.search(&vector, &filter, top_k).await?;

    let hits: Vec<SearchHit> = results
        .into_iter()
        .map(|(payload, score)| SearchHit {
            url: format!("{}#{}", payload.url, payload.anchor),
            content: payload.content,
            kind: payload.kind,
            score,
        })
        .collect();

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. {} [{}] (score {:.4})", i + 1, hit.url, hit.kind, hit.score);
        println!("   {}", snippet(&hit.content));
    }
    Ok(())
}

fn parse_kinds(kinds: &[String]) -> Result<Vec<ChunkKind>> {
    kinds
        .iter()
        .map(|k| {
            ChunkKind::parse(k)
                .ok_or_else(|| anyhow::anyhow!("Unknown kind '{}'. Valid values: text, code", k))
        })
        .collect()
}

fn snippet(content: &str) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}
