//! Exact inner-product vector index.
//!
//! [`VectorIndex`] is append-only: every inserted vector gets a sequential
//! handle equal to the number of vectors stored before it. Search is brute
//! force over a contiguous buffer, so rankings are exact and reproducible.

use crate::embedding::dot;
use crate::error::{RagError, Result};

const BACKEND: &str = "FlatIndex";

/// An append-only, exact nearest-neighbour index over unit vectors.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self { dimension, data: Vec::new() }
    }

    /// Dimensionality of every stored vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 { 0 } else { self.data.len() / self.dimension }
    }

    /// Returns `true` if the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append vectors. Handles continue from the current count.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if any vector has the wrong
    /// dimension; nothing is inserted in that case.
    pub fn insert(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RagError::store(
                BACKEND,
                format!("expected dimension {}, got {}", self.dimension, bad.len()),
            ));
        }
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Return up to `top_k` `(handle, score)` pairs by descending inner product.
    ///
    /// Equal scores are ordered by ascending handle.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if `query` has the wrong dimension.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(RagError::store(
                BACKEND,
                format!(
                    "query dimension {} does not match index dimension {}",
                    query.len(),
                    self.dimension
                ),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(handle, vector)| (handle, dot(vector, query)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);
        Ok(scored)
    }
}
