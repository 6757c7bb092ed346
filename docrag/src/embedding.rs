//! Embedding providers and the normalizing [`Embedder`].
//!
//! An [`EmbeddingProvider`] is the pluggable model that maps text to raw
//! vectors. The [`Embedder`] wraps one, checks the shape of what it returns,
//! and L2-normalizes every vector so that inner product equals cosine
//! similarity downstream.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// Norm substituted for zero-length vectors during normalization.
pub const NORM_EPSILON: f32 = 1e-10;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Scale `vector` to unit Euclidean length in place.
///
/// A zero vector is divided by [`NORM_EPSILON`] instead of zero, which keeps
/// it all zeros rather than producing NaNs.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm = if norm == 0.0 { NORM_EPSILON } else { norm };
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

/// Inner product of two equally long vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Batch embedder that owns one initialized provider and normalizes its output.
///
/// Construct it once per process or session and share it; cloning is cheap.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder").field("provider", &self.provider.name()).finish()
    }
}

impl Embedder {
    /// Wrap an initialized provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed `texts` in one provider call, returning one unit vector per input.
    ///
    /// An empty batch returns an empty `Vec` without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails, returns a
    /// different number of vectors than inputs, or returns vectors of
    /// differing or zero length.
    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let name = self.provider.name();
        debug!(provider = name, batch_size = texts.len(), "embedding batch");

        let mut vectors = self.provider.embed_batch(texts).await.map_err(|e| {
            error!(provider = name, error = %e, "embedding provider failed");
            e
        })?;

        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingError {
                provider: name.to_string(),
                message: format!(
                    "provider returned {} vectors for {} inputs",
                    vectors.len(),
                    texts.len()
                ),
            });
        }

        let dim = vectors[0].len();
        if dim == 0 {
            return Err(RagError::EmbeddingError {
                provider: name.to_string(),
                message: "provider returned empty vectors".to_string(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(RagError::EmbeddingError {
                provider: name.to_string(),
                message: format!("inconsistent dimensions in one batch: {dim} and {}", bad.len()),
            });
        }

        for vector in &mut vectors {
            normalize(vector);
        }
        Ok(vectors)
    }

    /// Embed a single query text.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text]).await?.pop().ok_or_else(|| RagError::EmbeddingError {
            provider: self.provider.name().to_string(),
            message: "provider returned no embedding".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Returns fixed raw vectors regardless of input.
    struct FixedProvider {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.vectors[0].clone())
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(self.vectors.clone())
        }

        fn dimensions(&self) -> usize {
            self.vectors[0].len()
        }

        fn name(&self) -> &str {
            "Fixed"
        }
    }

    fn embedder(vectors: Vec<Vec<f32>>) -> Embedder {
        Embedder::new(Arc::new(FixedProvider { vectors }))
    }

    #[test]
    fn normalize_scales_to_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_keeps_zero_vector_finite() {
        let mut v = vec![0.0; 4];
        normalize(&mut v);
        assert!(v.iter().all(|x| x.is_finite() && *x == 0.0));
    }

    #[tokio::test]
    async fn empty_batch_returns_empty() {
        let embedder = embedder(vec![vec![1.0, 2.0]]);
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn output_vectors_are_unit_norm() {
        let embedder = embedder(vec![vec![1.0, 2.0, 2.0], vec![-5.0, 0.0, 0.0]]);
        let vectors = embedder.embed(&["a", "b"]).await.unwrap();
        assert_eq!(vectors.len(), 2);
        for v in &vectors {
            assert!((norm(v) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn count_mismatch_is_an_embedding_error() {
        let embedder = embedder(vec![vec![1.0, 0.0]]);
        let err = embedder.embed(&["a", "b"]).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }

    #[tokio::test]
    async fn mixed_dimensions_are_an_embedding_error() {
        let embedder = embedder(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        let err = embedder.embed(&["a", "b"]).await.unwrap_err();
        assert!(err.to_string().contains("inconsistent dimensions"));
    }

    #[tokio::test]
    async fn embed_query_returns_single_vector() {
        let embedder = embedder(vec![vec![0.0, 2.0]]);
        let v = embedder.embed_query("q").await.unwrap();
        assert_eq!(v, vec![0.0, 1.0]);
    }
}
