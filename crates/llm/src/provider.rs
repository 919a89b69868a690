use async_trait::async_trait;

/// A text-completion backend. Each server flavour implements this.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a raw prompt and return the generated text, trimmed.
    ///
    /// An empty string is a valid generation; failures are always `Err`.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Where requests go, for logs and user-facing error messages.
    fn endpoint(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
}

impl LlmError {
    /// Transport failures and server-side errors may succeed on a retry;
    /// a rejected or unparsable request will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(_) => true,
            LlmError::ApiError { status, .. } => *status >= 500 || *status == 429,
            LlmError::ParseError(_) => false,
        }
    }
}
