use std::num::NonZeroUsize;

use lru::LruCache;

/// LRU memo of query text to its normalized embedding.
///
/// Keys are the exact query strings, so two different questions can never
/// share a vector.
pub struct EmbeddingCache {
    cache: LruCache<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Look up a cached embedding, refreshing its recency on a hit.
    pub fn get(&mut self, text: &str) -> Option<Vec<f32>> {
        self.cache.get(text).cloned()
    }

    pub fn put(&mut self, text: &str, embedding: Vec<f32>) {
        self.cache.put(text.to_string(), embedding);
    }
}
