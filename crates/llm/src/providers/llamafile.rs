use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docchat_core::config::LlmConfig;

use crate::provider::{CompletionProvider, LlmError};
use crate::retry::{with_retry, RetryPolicy};

/// Client for the llama.cpp / llamafile `/completion` endpoint.
pub struct LlamafileProvider {
    client: reqwest::Client,
    url: String,
    max_tokens: u32,
    temperature: f32,
    stop: Vec<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: Option<String>,
}

impl LlamafileProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            url: config.completion_url(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stop: config.stop.clone(),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, LlmError> {
        let body = CompletionRequest {
            prompt,
            n_predict: self.max_tokens,
            temperature: self.temperature,
            stop: &self.stop,
        };

        debug!("Completion request to {}", self.url);

        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        let content = resp
            .content
            .ok_or_else(|| LlmError::ParseError("missing content".into()))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl CompletionProvider for LlamafileProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        with_retry(self.retry, || self.complete_once(prompt)).await
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Serve one canned (status, body) per connection, forwarding each
    /// request body to the returned channel.
    async fn mock_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, mpsc::UnboundedReceiver<serde_json::Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request_body = read_request_body(&mut socket).await;
                let _ = tx.send(serde_json::from_slice(&request_body).unwrap_or_default());
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("{}", addr.port()), rx)
    }

    async fn read_request_body(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return Vec::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let len: usize = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                let body_start = pos + 4;
                while buf.len() < body_start + len {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                return buf[body_start..].to_vec();
            }
        }
    }

    fn config_for(port: &str) -> LlmConfig {
        LlmConfig {
            host: "127.0.0.1".into(),
            port: port.parse().unwrap(),
            retry_delay_ms: 0,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn sends_completion_request_and_trims_content() {
        let (port, mut requests) = mock_server(vec![(200, r#"{"content":"  Paris.\n","stop":true}"#)]).await;
        let provider = LlamafileProvider::from_config(&config_for(&port)).unwrap();

        let answer = provider.complete("Human: capital of France?\nAssistant:").await.unwrap();
        assert_eq!(answer, "Paris.");

        let sent = requests.recv().await.unwrap();
        assert_eq!(sent["prompt"], "Human: capital of France?\nAssistant:");
        assert_eq!(sent["n_predict"], 1024);
        assert_eq!(sent["stop"], serde_json::json!(["</s>", "Human:", "Assistant:"]));
        assert!((sent["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_generation_is_not_an_error() {
        let (port, _requests) = mock_server(vec![(200, r#"{"content":"   "}"#)]).await;
        let provider = LlamafileProvider::from_config(&config_for(&port)).unwrap();
        assert_eq!(provider.complete("x").await.unwrap(), "");
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let (port, _requests) = mock_server(vec![
            (503, r#"{"error":"loading"}"#),
            (200, r#"{"content":"ready"}"#),
        ])
        .await;
        let provider = LlamafileProvider::from_config(&config_for(&port)).unwrap();
        assert_eq!(provider.complete("x").await.unwrap(), "ready");
    }

    #[tokio::test]
    async fn missing_content_is_a_parse_error() {
        let (port, _requests) = mock_server(vec![(200, r#"{"tokens_predicted":0}"#)]).await;
        let provider = LlamafileProvider::from_config(&config_for(&port)).unwrap();
        assert!(matches!(provider.complete("x").await, Err(LlmError::ParseError(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        drop(listener);

        let provider = LlamafileProvider::from_config(&LlmConfig {
            max_retries: 2,
            ..config_for(&port)
        })
        .unwrap();
        assert_eq!(provider.endpoint(), format!("http://127.0.0.1:{port}/completion"));
        assert!(matches!(provider.complete("x").await, Err(LlmError::HttpError(_))));
    }
}
