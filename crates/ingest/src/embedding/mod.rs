pub mod cache;
pub mod ollama;
pub mod openai;
pub mod traits;

#[cfg(test)]
mod test_server;

use std::sync::Arc;

use docchat_core::config::EmbeddingConfig;

pub use cache::EmbeddingCache;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{check_batch, dot, l2_normalize, Embedder, EmbeddingError};

/// Create the embedding backend selected in config.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedder::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAiEmbedder::from_config(config)?)),
        other => Err(EmbeddingError::NotConfigured(format!(
            "unknown embedding provider: '{other}'"
        ))),
    }
}
