//! Document ingestion and retrieval: extraction, chunking, embedding and
//! top-k similarity search over a single in-memory document.

pub mod document;
pub mod embedding;
pub mod index;
pub mod processor;

pub use document::chunker::{chunk_text, Chunk, ChunkConfig};
pub use document::{extract_text, normalize_text, ExtractedDocument, ExtractionError};
pub use embedding::{create_embedder, Embedder, EmbeddingError};
pub use index::{RetrievalIndex, RetrievalResult};
pub use processor::{DocumentProcessor, ProcessError, ProcessingReport};
