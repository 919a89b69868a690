use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding count mismatch: sent {sent} texts, got {received} vectors")]
    CountMismatch { sent: usize, received: usize },

    #[error("Embedder not configured: {0}")]
    NotConfigured(String),
}

/// Trait for embedding backends (Ollama, OpenAI-compatible, ...).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}

/// Check that a backend answered `sent` texts with `sent` vectors of
/// `dimensions` floats each.
pub fn check_batch(
    vectors: &[Vec<f32>],
    sent: usize,
    dimensions: usize,
) -> Result<(), EmbeddingError> {
    if vectors.len() != sent {
        return Err(EmbeddingError::CountMismatch {
            sent,
            received: vectors.len(),
        });
    }
    match vectors.iter().find(|v| v.len() != dimensions) {
        Some(v) => Err(EmbeddingError::DimensionMismatch {
            expected: dimensions,
            actual: v.len(),
        }),
        None => Ok(()),
    }
}

/// Scale `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product over the shared prefix of two vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn batch_shape_is_checked() {
        let vectors = vec![vec![0.0; 3], vec![0.0; 3]];
        assert!(check_batch(&vectors, 2, 3).is_ok());
        assert!(matches!(
            check_batch(&vectors, 3, 3),
            Err(EmbeddingError::CountMismatch { sent: 3, received: 2 })
        ));
        assert!(matches!(
            check_batch(&vectors, 2, 4),
            Err(EmbeddingError::DimensionMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn dot_of_orthogonal_unit_vectors_is_zero() {
        assert_eq!(dot(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(dot(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
    }
}
