//! Vector index collaborator: Qdrant over its REST API.
//!
//! The pipeline only needs four operations — recreate the collection,
//! bulk upsert, filtered similarity search, and a full scroll for
//! snapshot export — so this client speaks plain JSON over `reqwest`
//! rather than pulling in a gRPC stack.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::IndexConfig;
use crate::models::ChunkKind;

/// Payload stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub content: String,
    pub url: String,
    pub anchor: String,
    pub doc_type: Option<String>,
    pub kind: ChunkKind,
}

/// One point as Qdrant stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// Search filter: doc types OR-combined, kinds OR-combined, the two
/// groups AND-combined. An empty group places no constraint.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub doc_types: Vec<String>,
    pub kinds: Vec<ChunkKind>,
}

pub struct DocIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    distance: String,
}

impl DocIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            distance: config.distance.clone(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    /// Drop and re-create the collection with the given dimensionality.
    pub async fn recreate(&self, dims: usize) -> Result<()> {
        if dims == 0 {
            bail!("Cannot create a collection with zero-dimensional vectors");
        }

        // A missing collection is fine on delete.
        self.client
            .delete(self.collection_url())
            .send()
            .await
            .context("Failed to reach the vector index")?;

        let body = json!({
            "vectors": { "size": dims, "distance": self.distance }
        });
        let resp = self
            .client
            .put(self.collection_url())
            .json(&body)
            .send()
            .await
            .context("Failed to create collection")?;
        ensure_success(resp, "create collection").await?;
        Ok(())
    }

    /// Upsert a batch of points, waiting for the write to land.
    pub async fn upsert(&self, points: &[IndexPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let resp = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await
            .context("Failed to upsert points")?;
        ensure_success(resp, "upsert points").await?;
        Ok(())
    }

    /// Similarity search, returning `(payload, score)` pairs best-first.
    pub async fn search(
        &self,
        vector: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<(ChunkPayload, f64)>> {
        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(filter) = build_filter(filter) {
            body["filter"] = filter;
        }

        let resp = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&body)
            .send()
            .await
            .context("Failed to search the vector index")?;
        let json = ensure_success(resp, "search").await?;

        let hits = json
            .get("result")
            .and_then(|r| r.as_array())
            .ok_or_else(|| anyhow!("Invalid search response: missing result array"))?;

        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            let payload: ChunkPayload = serde_json::from_value(
                hit.get("payload")
                    .cloned()
                    .ok_or_else(|| anyhow!("Search hit without payload"))?,
            )
            .context("Malformed search hit payload")?;
            let score = hit.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            out.push((payload, score));
        }
        Ok(out)
    }

    /// Scroll the whole collection, vectors included, for export.
    pub async fn scroll_all(&self, batch: usize) -> Result<Vec<IndexPoint>> {
        let mut points = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": batch,
                "with_payload": true,
                "with_vector": true,
            });
            if let Some(ref o) = offset {
                body["offset"] = o.clone();
            }

            let resp = self
                .client
                .post(format!("{}/points/scroll", self.collection_url()))
                .json(&body)
                .send()
                .await
                .context("Failed to scroll the vector index")?;
            let json = ensure_success(resp, "scroll").await?;

            let result = json
                .get("result")
                .ok_or_else(|| anyhow!("Invalid scroll response"))?;
            let batch_points = result
                .get("points")
                .and_then(|p| p.as_array())
                .ok_or_else(|| anyhow!("Invalid scroll response: missing points"))?;

            for p in batch_points {
                points.push(parse_point(p)?);
            }

            match result.get("next_page_offset") {
                Some(o) if !o.is_null() => offset = Some(o.clone()),
                _ => break,
            }
        }
        Ok(points)
    }
}

fn parse_point(p: &Value) -> Result<IndexPoint> {
    let id = match p.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => bail!("Point without id"),
    };
    let vector: Vec<f32> = serde_json::from_value(
        p.get("vector")
            .cloned()
            .ok_or_else(|| anyhow!("Point {} has no vector", id))?,
    )
    .with_context(|| format!("Malformed vector on point {}", id))?;
    let payload: ChunkPayload = serde_json::from_value(
        p.get("payload")
            .cloned()
            .ok_or_else(|| anyhow!("Point {} has no payload", id))?,
    )
    .with_context(|| format!("Malformed payload on point {}", id))?;
    Ok(IndexPoint {
        id,
        vector,
        payload,
    })
}

/// Builds the Qdrant filter JSON, or `None` when both groups are empty.
fn build_filter(filter: &SearchFilter) -> Option<Value> {
    let mut must = Vec::new();

    if !filter.doc_types.is_empty() {
        let should: Vec<Value> = filter
            .doc_types
            .iter()
            .map(|t| json!({ "key": "doc_type", "match": { "value": t } }))
            .collect();
        must.push(json!({ "should": should }));
    }
    if !filter.kinds.is_empty() {
        let should: Vec<Value> = filter
            .kinds
            .iter()
            .map(|k| json!({ "key": "kind", "match": { "value": k.as_str() } }))
            .collect();
        must.push(json!({ "should": should }));
    }

    if must.is_empty() {
        None
    } else {
        Some(json!({ "must": must }))
    }
}

async fn ensure_success(resp: reqwest::Response, what: &str) -> Result<Value> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("Vector index {} failed with {}: {}", what, status, body);
    }
    resp.json::<Value>()
        .await
        .with_context(|| format!("Invalid JSON from vector index during {}", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_is_omitted() {
        assert!(build_filter(&SearchFilter::default()).is_none());
    }

    #[test]
    fn test_filter_groups_or_within_and_across() {
        let filter = SearchFilter {
            doc_types: vec!["tutorials".to_string(), "recipes".to_string()],
            kinds: vec![ChunkKind::Code],
        };
        let json = build_filter(&filter).unwrap();
        let must = json["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["should"].as_array().unwrap().len(), 2);
        assert_eq!(
            must[1]["should"][0]["match"]["value"],
            Value::String("code".to_string())
        );
    }

    #[test]
    fn test_point_serialization_shape() {
        let point = IndexPoint {
            id: "abc".to_string(),
            vector: vec![0.5, 0.25],
            payload: ChunkPayload {
                content: "hello".to_string(),
                url: "https://docs.example.com/a.html".to_string(),
                anchor: "intro".to_string(),
                doc_type: Some("tutorials".to_string()),
                kind: ChunkKind::Text,
            },
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["payload"]["kind"], "text");
        assert_eq!(value["vector"][1], 0.25);
        let back = parse_point(&value).unwrap();
        assert_eq!(back, point);
    }
}
