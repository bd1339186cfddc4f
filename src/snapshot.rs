//! JSON snapshots of the vector index.
//!
//! A snapshot is a single JSON object mapping chunk id to its vector
//! and payload, so an index built on one machine can be rebuilt on
//! another without re-embedding. The mapping is unordered; round-trip
//! preserves every entry.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::index::{ChunkPayload, DocIndex, IndexPoint};

const SNAPSHOT_BATCH: usize = 256;

/// One exported chunk: embedding vector plus everything needed to
/// rebuild its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub vector: Vec<f32>,
    pub content: String,
    pub url: String,
    pub anchor: String,
    pub doc_type: Option<String>,
    pub kind: crate::models::ChunkKind,
}

impl SnapshotEntry {
    fn from_point(point: IndexPoint) -> (String, Self) {
        let entry = Self {
            vector: point.vector,
            content: point.payload.content,
            url: point.payload.url,
            anchor: point.payload.anchor,
            doc_type: point.payload.doc_type,
            kind: point.payload.kind,
        };
        (point.id, entry)
    }

    fn into_point(self, id: String) -> IndexPoint {
        IndexPoint {
            id,
            vector: self.vector,
            payload: ChunkPayload {
                content: self.content,
                url: self.url,
                anchor: self.anchor,
                doc_type: self.doc_type,
                kind: self.kind,
            },
        }
    }
}

/// Export the whole collection to a JSON snapshot file.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let path = output.unwrap_or(&config.snapshot.path);
    let index = DocIndex::new(&config.index)?;

    let points = index.scroll_all(SNAPSHOT_BATCH).await?;
    let snapshot: HashMap<String, SnapshotEntry> =
        points.into_iter().map(SnapshotEntry::from_point).collect();

    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;

    println!("Exported {} chunks to {}", snapshot.len(), path.display());
    Ok(())
}

/// Rebuild the collection from a JSON snapshot file.
pub async fn run_import(config: &Config, input: Option<&Path>) -> Result<()> {
    let path = input.unwrap_or(&config.snapshot.path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: HashMap<String, SnapshotEntry> =
        serde_json::from_str(&content).context("Failed to parse snapshot JSON")?;

    if snapshot.is_empty() {
        bail!("Snapshot {} contains no chunks", path.display());
    }

    // Dimensionality comes from the snapshot itself, so imports work
    // even with embeddings disabled locally.
    let dims = snapshot.values().next().map(|e| e.vector.len()).unwrap_or(0);
    if dims == 0 {
        bail!("Snapshot {} has zero-dimensional vectors", path.display());
    }

    let index = DocIndex::new(&config.index)?;
    index.recreate(dims).await?;

    let points: Vec<IndexPoint> = snapshot
        .into_iter()
        .map(|(id, entry)| entry.into_point(id))
        .collect();
    for batch in points.chunks(SNAPSHOT_BATCH) {
        index.upsert(batch).await?;
    }

    println!("Imported {} chunks from {}", points.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkKind;

    fn sample_point(id: &str, kind: ChunkKind) -> IndexPoint {
        IndexPoint {
            id: id.to_string(),
            vector: vec![0.1, 0.2, 0.3],
            payload: ChunkPayload {
                content: "some content".to_string(),
                url: "https://docs.example.com/p.html".to_string(),
                anchor: "anchor".to_string(),
                doc_type: Some("tutorials".to_string()),
                kind,
            },
        }
    }

    #[test]
    fn test_snapshot_round_trip_preserves_points() {
        let points = vec![
            sample_point("a", ChunkKind::Text),
            sample_point("b", ChunkKind::Code),
        ];
        let snapshot: HashMap<String, SnapshotEntry> = points
            .iter()
            .cloned()
            .map(SnapshotEntry::from_point)
            .collect();

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let parsed: HashMap<String, SnapshotEntry> = serde_json::from_str(&json).unwrap();

        let mut restored: Vec<IndexPoint> = parsed
            .into_iter()
            .map(|(id, entry)| entry.into_point(id))
            .collect();
        restored.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(restored, points);
    }

    #[test]
    fn test_snapshot_entry_json_shape() {
        let (_, entry) = SnapshotEntry::from_point(sample_point("a", ChunkKind::Code));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "code");
        assert_eq!(value["vector"].as_array().unwrap().len(), 3);
        assert_eq!(value["doc_type"], "tutorials");
    }
}
