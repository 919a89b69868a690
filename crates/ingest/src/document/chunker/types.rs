//! Chunk configuration and output types.

use docchat_core::error::ConfigError;

// ── Configuration ───────────────────────────────────────────────────────────

/// Window parameters for the chunking engine, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    size: usize,
    overlap: usize,
}

impl ChunkConfig {
    /// Requires `0 <= overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if overlap >= size {
            return Err(ConfigError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance between consecutive chunk starts.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// A window of document text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based position in the chunk sequence.
    pub index: usize,
    /// The chunk text content.
    pub content: String,
    /// Character (not byte) offset in the normalized document text.
    pub char_offset: usize,
}
