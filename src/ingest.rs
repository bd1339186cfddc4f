//! Indexing orchestration: scan pages, chunk them, embed, upsert.

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use crate::chunk::{page_to_chunks, ChunkLimits};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::index::{ChunkPayload, DocIndex, IndexPoint};
use crate::models::Page;
use crate::pages::scan_pages;
use crate::render::render_markdown;
use crate::validate::ValidationRules;

/// Build (or rebuild) the index from the configured docs tree.
///
/// Pages are processed sequentially; a page that cannot be read or
/// yields no valid chunks is reported and skipped, the batch continues.
/// With `dry_run` the pipeline runs through chunking only and prints
/// what it would index.
pub async fn run_index(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    let mut pages = scan_pages(&config.docs)?;
    if let Some(n) = limit {
        pages.truncate(n);
    }
    println!("Found {} documentation pages", pages.len());

    let limits = ChunkLimits {
        max_chunk_chars: config.chunking.max_chunk_chars,
    };
    let rules = ValidationRules::from_config(&config.chunking, &config.validation);

    if dry_run {
        return dry_run_report(&pages, &limits, &rules);
    }

    if !config.embedding.is_enabled() {
        bail!("Indexing requires an embedding provider; set [embedding] provider = \"openai\"");
    }
    let embedder = Embedder::from_config(&config.embedding)?;
    let index = DocIndex::new(&config.index)?;
    index.recreate(embedder.dims()).await?;

    let mut pages_indexed = 0usize;
    let mut pages_skipped = 0usize;
    let mut chunks_indexed = 0usize;

    for page in &pages {
        let chunks = match read_and_chunk(page, &limits, &rules) {
            Ok(chunks) => chunks,
            Err(e) => {
                eprintln!("Skipping {}: {:#}", page.filepath.display(), e);
                pages_skipped += 1;
                continue;
            }
        };
        if chunks.is_empty() {
            pages_skipped += 1;
            continue;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder
            .embed_all(&texts)
            .await
            .with_context(|| format!("Embedding failed for {}", page.url))?;

        let points: Vec<IndexPoint> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexPoint {
                id: Uuid::new_v4().to_string(),
                vector,
                payload: ChunkPayload {
                    content: chunk.content,
                    url: page.url.clone(),
                    anchor: chunk.anchor,
                    doc_type: page.doc_type.clone(),
                    kind: chunk.kind,
                },
            })
            .collect();

        index.upsert(&points).await?;
        chunks_indexed += points.len();
        pages_indexed += 1;
    }

    println!(
        "Indexed {} chunks from {} pages ({} skipped) into '{}'",
        chunks_indexed, pages_indexed, pages_skipped, config.index.collection
    );
    Ok(())
}

fn read_and_chunk(
    page: &Page,
    limits: &ChunkLimits,
    rules: &ValidationRules,
) -> Result<Vec<crate::models::Chunk>> {
    let html = std::fs::read_to_string(&page.filepath).context("Failed to read page")?;
    let markdown = render_markdown(&html);
    Ok(page_to_chunks(&markdown, limits, rules))
}

fn dry_run_report(pages: &[Page], limits: &ChunkLimits, rules: &ValidationRules) -> Result<()> {
    let mut total_text = 0usize;
    let mut total_code = 0usize;

    for page in pages {
        let chunks = match read_and_chunk(page, limits, rules) {
            Ok(chunks) => chunks,
            Err(e) => {
                eprintln!("Skipping {}: {:#}", page.filepath.display(), e);
                continue;
            }
        };
        let text = chunks
            .iter()
            .filter(|c| c.kind == crate::models::ChunkKind::Text)
            .count();
        let code = chunks.len() - text;
        total_text += text;
        total_code += code;
        println!(
            "{} -> {} text, {} code [{}]",
            page.url,
            text,
            code,
            page.doc_type.as_deref().unwrap_or("-")
        );
    }

    println!(
        "Dry run: {} text and {} code chunks across {} pages",
        total_text,
        total_code,
        pages.len()
    );
    Ok(())
}
