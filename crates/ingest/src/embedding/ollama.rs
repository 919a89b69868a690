use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docchat_core::config::EmbeddingConfig;

use super::traits::{check_batch, Embedder, EmbeddingError};

/// Embedder backed by a local Ollama instance (e.g. the `all-minilm`
/// sentence-embedding model).
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            url: format!("{}/api/embed", config.ollama_url.trim_end_matches('/')),
            model: config.model.clone(),
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
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!("Embedding {} texts via {}", texts.len(), self.url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api { status, body });
        }

        let parsed: EmbedResponse = response.json().await?;
        check_batch(&parsed.embeddings, texts.len(), self.dimensions)?;
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::test_server;

    fn embedder(url: String, dimensions: usize) -> OllamaEmbedder {
        OllamaEmbedder::from_config(&EmbeddingConfig {
            ollama_url: format!("{url}/"),
            dimensions,
            ..EmbeddingConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_model_and_inputs_to_api_embed() {
        let (url, mut requests) =
            test_server::serve(vec![(200, r#"{"model":"all-minilm","embeddings":[[1,0],[0,1]]}"#)])
                .await;
        let vectors = embedder(url, 2).embed_batch(&["alpha", "beta"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        let sent = requests.recv().await.unwrap();
        assert_eq!(sent.path, "/api/embed");
        assert_eq!(
            sent.body,
            serde_json::json!({"model": "all-minilm", "input": ["alpha", "beta"]})
        );
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let (url, _requests) = test_server::serve(vec![(404, r#"{"error":"model not found"}"#)]).await;
        match embedder(url, 2).embed_batch(&["alpha"]).await {
            Err(EmbeddingError::Api { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("model not found"));
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn short_reply_is_a_count_mismatch() {
        let (url, _requests) = test_server::serve(vec![(200, r#"{"embeddings":[[1,0]]}"#)]).await;
        assert!(matches!(
            embedder(url, 2).embed_batch(&["alpha", "beta"]).await,
            Err(EmbeddingError::CountMismatch { sent: 2, received: 1 })
        ));
    }

    #[tokio::test]
    async fn wrong_width_is_a_dimension_mismatch() {
        let (url, _requests) = test_server::serve(vec![(200, r#"{"embeddings":[[1,0,0]]}"#)]).await;
        assert!(matches!(
            embedder(url, 2).embed_batch(&["alpha"]).await,
            Err(EmbeddingError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
