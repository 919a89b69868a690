//! Document processor: extraction → chunking → batched embedding → index.
//!
//! Owns the single document a chat session is grounded in. Processing is
//! the expensive step (model inference over every chunk) and is memoized on
//! the document path; searching never reprocesses.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::document::chunker::{chunk_text, ChunkConfig};
use crate::document::{extract_text, normalize_text, supported_extension, ExtractionError};
use crate::embedding::{check_batch, l2_normalize, Embedder, EmbeddingCache, EmbeddingError};
use crate::index::{LengthMismatch, RetrievalIndex, RetrievalResult};

const DEFAULT_BATCH_SIZE: usize = 32;
const QUERY_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] LengthMismatch),
}

/// What a `process_document` call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingReport {
    pub path: PathBuf,
    /// Characters of normalized text.
    pub characters: usize,
    pub chunks: usize,
    /// Embedding requests issued.
    pub batches: usize,
}

pub struct DocumentProcessor {
    embedder: Arc<dyn Embedder>,
    chunk_config: ChunkConfig,
    batch_size: usize,
    index: RetrievalIndex,
    source: Option<PathBuf>,
    query_cache: EmbeddingCache,
}

impl DocumentProcessor {
    pub fn new(embedder: Arc<dyn Embedder>, chunk_config: ChunkConfig) -> Self {
        Self {
            embedder,
            chunk_config,
            batch_size: DEFAULT_BATCH_SIZE,
            index: RetrievalIndex::new(),
            source: None,
            query_cache: EmbeddingCache::new(QUERY_CACHE_CAPACITY),
        }
    }

    /// Chunks per embedding request. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Path of the currently loaded document.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn index(&self) -> &RetrievalIndex {
        &self.index
    }

    /// Process `path` unless it is already the loaded document.
    pub async fn ensure_processed(
        &mut self,
        path: &Path,
    ) -> Result<Option<ProcessingReport>, ProcessError> {
        if self.source.as_deref() == Some(path) {
            return Ok(None);
        }
        self.process_document(path).await.map(Some)
    }

    /// Extract, chunk and embed `path`, replacing whatever was loaded before.
    ///
    /// On error the previously loaded document stays in place.
    pub async fn process_document(&mut self, path: &Path) -> Result<ProcessingReport, ProcessError> {
        info!("Processing document: {}", path.display());

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        supported_extension(&filename)?;

        let bytes = std::fs::read(path).map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extracted = extract_text(&bytes, &filename)?;

        let text = normalize_text(&extracted.full_text());
        let characters = text.chars().count();
        info!("Extracted {} characters", characters);

        let chunks = chunk_text(&text, &self.chunk_config);
        info!("Created {} chunks", chunks.len());

        let mut embeddings = Vec::with_capacity(chunks.len());
        let mut batches = 0;
        for (b, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let vectors = self.embed_normalized(&texts).await?;
            embeddings.extend(vectors);
            batches += 1;

            let first = b * self.batch_size;
            info!("Processed chunk batch {} to {}", first + 1, first + batch.len());
        }

        let report = ProcessingReport {
            path: path.to_path_buf(),
            characters,
            chunks: chunks.len(),
            batches,
        };
        self.index.replace(chunks, embeddings)?;
        self.source = Some(path.to_path_buf());
        info!("Embeddings generated successfully");
        Ok(report)
    }

    /// The `top_k` chunks most similar to `query`, best first.
    ///
    /// Returns an empty list when no document has been processed.
    pub async fn search(
        &mut self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, ProcessError> {
        if self.index.is_empty() {
            warn!("No document chunks available for search");
            return Ok(Vec::new());
        }

        info!("Searching for: {}", query);
        let query_vec = match self.query_cache.get(query) {
            Some(v) => v,
            None => {
                let mut vectors = self.embed_normalized(&[query]).await?;
                let v = vectors.pop().ok_or(EmbeddingError::CountMismatch {
                    sent: 1,
                    received: 0,
                })?;
                self.query_cache.put(query, v.clone());
                v
            }
        };

        let results = self.index.search_by_vector(&query_vec, top_k);
        info!("Found {} relevant chunks", results.len());
        Ok(results)
    }

    /// Embed `texts` and L2-normalize every vector, checking shape.
    async fn embed_normalized(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = self.embedder.embed_batch(texts).await?;
        check_batch(&vectors, texts.len(), self.embedder.dimensions())?;
        for v in vectors.iter_mut() {
            l2_normalize(v);
        }
        Ok(vectors)
    }
}
