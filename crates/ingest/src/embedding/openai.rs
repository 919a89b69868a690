use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docchat_core::config::EmbeddingConfig;

use super::traits::{check_batch, Embedder, EmbeddingError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible embedding backend.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Fails with `NotConfigured` when no API key is set.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| EmbeddingError::NotConfigured("OPENAI_API_KEY not set".into()))?;
        let base = config.openai_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            api_key,
            model: config.model.clone(),
            url: format!("{}/v1/embeddings", base.trim_end_matches('/')),
            dimensions: config.dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

/// Place each item at its `index`. Gaps, duplicates and out-of-range
/// indexes leave the batch short.
fn in_input_order(items: Vec<EmbedItem>, sent: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let received = items.len();
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; sent];
    for item in items {
        if let Some(slot) = slots.get_mut(item.index) {
            *slot = Some(item.embedding);
        }
    }
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .filter(|_| received == sent)
        .ok_or(EmbeddingError::CountMismatch { sent, received })
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!("Embedding {} texts via {}", texts.len(), self.url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api { status, body });
        }

        let parsed: EmbedResponse = response.json().await?;
        let vectors = in_input_order(parsed.data, texts.len())?;
        check_batch(&vectors, texts.len(), self.dimensions)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
