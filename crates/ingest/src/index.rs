//! In-memory retrieval index: chunks plus their normalized embeddings,
//! searched exhaustively by dot product.

use crate::document::chunker::Chunk;
use crate::embedding::dot;

/// A chunk and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("index needs one embedding per chunk: {chunks} chunks, {embeddings} embeddings")]
pub struct LengthMismatch {
    pub chunks: usize,
    pub embeddings: usize,
}

/// Brute-force index over one document. Entry `i` of `chunks` and
/// `embeddings` always describe the same chunk.
#[derive(Debug, Default)]
pub struct RetrievalIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
}

impl RetrievalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new document's contents, discarding the previous one.
    pub fn replace(
        &mut self,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(), LengthMismatch> {
        if chunks.len() != embeddings.len() {
            return Err(LengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        self.chunks = chunks;
        self.embeddings = embeddings;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The `top_k` chunks most similar to `query`, best first.
    ///
    /// Both sides must already be L2-normalized. Equal scores keep chunk
    /// order, so identical inputs always give identical output.
    pub fn search_by_vector(&self, query: &[f32], top_k: usize) -> Vec<RetrievalResult> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, emb)| (i, dot(emb, query)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, score)| RetrievalResult {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }
}
