//! Fixed-window chunking engine.
//!
//! Splits normalized document text into overlapping character windows
//! suitable for embedding. Boundaries depend only on the text and the
//! configuration, so the same input always yields the same chunks.

mod types;

pub use types::{Chunk, ChunkConfig};

/// Split `text` into windows of `config.size` characters, each starting
/// `size - overlap` characters after the previous one.
///
/// Empty text yields no chunks; the last chunk may be shorter than the window.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<Chunk> {
    // Byte offset of every char, plus the end of the string, so windows
    // are cut on char boundaries while counting in characters.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let len = bounds.len();
    bounds.push(text.len());

    let step = config.step();
    let mut chunks = Vec::with_capacity(len.div_ceil(step));
    let mut start = 0;
    while start < len {
        let end = (start + config.size()).min(len);
        chunks.push(Chunk {
            index: chunks.len(),
            content: text[bounds[start]..bounds[end]].to_string(),
            char_offset: start,
        });
        start += step;
    }
    chunks
}
