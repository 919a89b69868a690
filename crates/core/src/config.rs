use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Source of raw configuration values, keyed by env var name.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn opt(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key).filter(|s| !s.trim().is_empty())
}

fn or(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    opt(lookup, key).unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(lookup: Lookup<'_>, key: &str, default: T) -> T {
    match opt(lookup, key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable config value");
            default
        }),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub paths: PathsConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }

    /// Build config from an arbitrary key/value source.
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            retrieval: RetrievalConfig::from_lookup(lookup),
            llm: LlmConfig::from_lookup(lookup),
            embedding: EmbeddingConfig::from_lookup(lookup),
            paths: PathsConfig::from_lookup(lookup),
        }
    }

    /// Check cross-field invariants before anything is built from this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retrieval.validate()?;
        self.llm.validate()?;
        self.embedding.validate()
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  retrieval:  chunk_size={}, overlap={}, top_k={}, batch={}",
            self.retrieval.chunk_size,
            self.retrieval.chunk_overlap,
            self.retrieval.top_k,
            self.retrieval.embed_batch_size
        );
        tracing::info!(
            "  llm:        url={}, n_predict={}, temperature={}, retries={}",
            self.llm.completion_url(),
            self.llm.max_tokens,
            self.llm.temperature,
            self.llm.max_retries
        );
        tracing::info!(
            "  embedding:  provider={}, model={}, dims={}",
            self.embedding.provider,
            self.embedding.model,
            self.embedding.dimensions
        );
        tracing::info!(
            "  paths:      logs={}, uploads={}",
            self.paths.log_dir.display(),
            self.paths.upload_dir.display()
        );
    }
}

// ── Retrieval ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Chunks per embedding request.
    pub embed_batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            embed_batch_size: 32,
        }
    }
}

impl RetrievalConfig {
    fn from_lookup(l: Lookup<'_>) -> Self {
        let d = Self::default();
        Self {
            chunk_size: parsed(l, "DOCCHAT_CHUNK_SIZE", d.chunk_size),
            chunk_overlap: parsed(l, "DOCCHAT_CHUNK_OVERLAP", d.chunk_overlap),
            top_k: parsed(l, "DOCCHAT_TOP_K", d.top_k),
            embed_batch_size: parsed(l, "DOCCHAT_EMBED_BATCH_SIZE", d.embed_batch_size),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::Zero("top_k"));
        }
        if self.embed_batch_size == 0 {
            return Err(ConfigError::Zero("embed_batch_size"));
        }
        Ok(())
    }
}

// ── LLM completion endpoint ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    /// Maximum tokens to generate (`n_predict`).
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
    /// Request timeout in seconds; 0 disables the timeout.
    pub timeout_secs: u64,
    /// Total attempts per completion call.
    pub max_retries: u32,
    /// Base delay before the first retry, doubled on every further attempt.
    pub retry_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            path: "/completion".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            stop: vec![
                "</s>".to_string(),
                "Human:".to_string(),
                "Assistant:".to_string(),
            ],
            timeout_secs: 300,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl LlmConfig {
    fn from_lookup(l: Lookup<'_>) -> Self {
        let d = Self::default();
        let stop = opt(l, "LLM_STOP")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(d.stop);
        Self {
            host: or(l, "LLM_HOST", &d.host),
            port: parsed(l, "LLM_PORT", d.port),
            path: or(l, "LLM_PATH", &d.path),
            max_tokens: parsed(l, "LLM_MAX_TOKENS", d.max_tokens),
            temperature: parsed(l, "LLM_TEMPERATURE", d.temperature),
            stop,
            timeout_secs: parsed(l, "LLM_TIMEOUT_SECS", d.timeout_secs),
            max_retries: parsed(l, "LLM_MAX_RETRIES", d.max_retries),
            retry_delay_ms: parsed(l, "LLM_RETRY_DELAY_MS", d.retry_delay_ms),
        }
    }

    /// Full URL of the completion endpoint.
    pub fn completion_url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Empty("LLM host"));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Zero("max_retries"));
        }
        Ok(())
    }
}

// ── Embedding model ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    pub ollama_url: String,
    pub model: String,
    pub dimensions: usize,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    /// Per-request timeout for embedding calls (0 = none).
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            openai_api_key: None,
            openai_base_url: None,
            timeout_secs: 120,
        }
    }
}

impl EmbeddingConfig {
    fn from_lookup(l: Lookup<'_>) -> Self {
        let d = Self::default();
        Self {
            provider: or(l, "EMBEDDING_PROVIDER", &d.provider).to_lowercase(),
            ollama_url: or(l, "OLLAMA_URL", &d.ollama_url),
            model: or(l, "EMBEDDING_MODEL", &d.model),
            dimensions: parsed(l, "EMBEDDING_DIMENSIONS", d.dimensions),
            openai_api_key: opt(l, "OPENAI_API_KEY"),
            openai_base_url: opt(l, "OPENAI_BASE_URL"),
            timeout_secs: parsed(l, "EMBEDDING_TIMEOUT_SECS", d.timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider.as_str() {
            "ollama" | "openai" => {}
            other => return Err(ConfigError::UnknownProvider(other.to_string())),
        }
        if self.dimensions == 0 {
            return Err(ConfigError::Zero("embedding dimensions"));
        }
        Ok(())
    }
}

// ── Filesystem locations ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Metrics log, session summaries and `app.log`.
    pub log_dir: PathBuf,
    /// Where chosen documents are copied before processing.
    pub upload_dir: PathBuf,
}

impl PathsConfig {
    fn from_lookup(l: Lookup<'_>) -> Self {
        Self {
            log_dir: PathBuf::from(or(l, "DOCCHAT_LOG_DIR", "logs")),
            upload_dir: PathBuf::from(or(l, "DOCCHAT_UPLOAD_DIR", "uploads")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(&|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_reference_constants() {
        let config = config_from(&[]);
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.retrieval.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.llm.completion_url(), "http://localhost:8080/completion");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.stop, vec!["</s>", "Human:", "Assistant:"]);
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.paths.log_dir, PathBuf::from("logs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("DOCCHAT_CHUNK_SIZE", "500"),
            ("DOCCHAT_CHUNK_OVERLAP", "50"),
            ("LLM_HOST", "10.0.0.2"),
            ("LLM_PORT", "9000"),
            ("LLM_PATH", "v1/complete"),
            ("LLM_STOP", "<|end|>, User:"),
            ("EMBEDDING_PROVIDER", "OpenAI"),
        ]);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.chunk_overlap, 50);
        assert_eq!(config.llm.completion_url(), "http://10.0.0.2:9000/v1/complete");
        assert_eq!(config.llm.stop, vec!["<|end|>", "User:"]);
        assert_eq!(config.embedding.provider, "openai");
    }

    #[test]
    fn embedding_timeout_is_configurable() {
        assert_eq!(config_from(&[]).embedding.timeout_secs, 120);
        let config = config_from(&[("EMBEDDING_TIMEOUT_SECS", "0")]);
        assert_eq!(config.embedding.timeout_secs, 0);
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = config_from(&[("DOCCHAT_TOP_K", "many"), ("LLM_TEMPERATURE", "")]);
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn overlap_must_be_smaller_than_window() {
        let config = config_from(&[("DOCCHAT_CHUNK_SIZE", "100"), ("DOCCHAT_CHUNK_OVERLAP", "100")]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge { size: 100, overlap: 100 })
        );
    }

    #[test]
    fn unknown_embedding_provider_is_rejected() {
        let config = config_from(&[("EMBEDDING_PROVIDER", "word2vec")]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownProvider("word2vec".to_string()))
        );
    }
}
