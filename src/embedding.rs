//! Turning chunk text into vectors.
//!
//! [`Embedder`] is the single entry point: built once from the
//! `[embedding]` config section, it batches texts against the OpenAI
//! embeddings endpoint and hands back vectors in input order. The
//! `disabled` provider builds fine (so dry runs and snapshot imports
//! need no API key) but refuses to embed.
//!
//! Transient failures are retried with capped exponential backoff
//! (1s, 2s, 4s, ... up to 32s): HTTP 429 and 5xx retry, any other 4xx
//! fails immediately, network errors retry until the attempt budget
//! runs out.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::EmbeddingConfig;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Embedding client, one per run.
#[derive(Debug)]
pub enum Embedder {
    Disabled,
    OpenAi(OpenAiClient),
}

impl Embedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.provider.as_str() {
            "disabled" => Ok(Embedder::Disabled),
            "openai" => Ok(Embedder::OpenAi(OpenAiClient::new(config)?)),
            other => bail!("Unknown embedding provider: {}", other),
        }
    }

    /// Vector dimensionality the index collection must be created with.
    pub fn dims(&self) -> usize {
        match self {
            Embedder::Disabled => 0,
            Embedder::OpenAi(client) => client.dims,
        }
    }

    /// Embeds any number of texts, splitting the work into API batches
    /// of the configured size. One vector per text, input order.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let client = match self {
            Embedder::Disabled => bail!("Embedding provider is disabled"),
            Embedder::OpenAi(client) => client,
        };
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(client.batch_size.max(1)) {
            vectors.extend(client.embed_batch(batch).await?);
        }
        Ok(vectors)
    }

    /// Embeds one query string, for search.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_all(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedding API returned no vector for the query"))
    }
}

/// Client for the OpenAI embeddings endpoint. Reads `OPENAI_API_KEY`
/// from the environment at construction time.
#[derive(Debug)]
pub struct OpenAiClient {
    model: String,
    dims: usize,
    api_key: String,
    batch_size: usize,
    max_retries: u32,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("embedding.model is required for the openai provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow!("embedding.dims is required for the openai provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            model,
            dims,
            api_key,
            batch_size: config.batch_size,
            max_retries: config.max_retries,
            http,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let resp = match self
                .http
                .post(OPENAI_EMBEDDINGS_URL)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_err = Some(anyhow!(e).context("Embedding request failed to send"));
                    continue;
                }
            };

            let status = resp.status();
            if status.is_success() {
                let parsed: EmbeddingResponse = resp
                    .json()
                    .await
                    .context("Malformed embedding API response")?;
                return collect_vectors(parsed.data, texts.len());
            }

            let detail = resp.text().await.unwrap_or_default();
            if status.as_u16() == 429 || status.is_server_error() {
                last_err = Some(anyhow!("Embedding API error {}: {}", status, detail));
                continue;
            }
            bail!("Embedding API rejected the request ({}): {}", status, detail);
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Embedding failed after retries")))
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << (attempt - 1).min(5))
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// Reorders response rows by their `index` field and checks that every
/// input got a vector back.
fn collect_vectors(mut rows: Vec<EmbeddingRow>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if rows.len() != expected {
        bail!(
            "Embedding API returned {} vectors for {} inputs",
            rows.len(),
            expected
        );
    }
    rows.sort_by_key(|row| row.index);
    Ok(rows.into_iter().map(|row| row.embedding).collect())
}
