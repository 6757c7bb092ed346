//! Session-scoped chunk store.
//!
//! A [`Store`] owns one [`VectorIndex`] and the chunk metadata for it. The
//! vector with handle `i` belongs to the chunk at position `i`; that alignment
//! holds after every call returns.
//!
//! All vectors in a store share one dimension. A batch with a different
//! dimension replaces the whole corpus instead of being merged, which is what
//! happens when the embedding model changes between uploads.

use tracing::{debug, warn};

use crate::document::{Chunk, RetrievalResult, SearchResult};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

const BACKEND: &str = "Store";

/// Chunk metadata plus the vector index that ranks it.
#[derive(Debug, Clone, Default)]
pub struct Store {
    index: Option<VectorIndex>,
    chunks: Vec<Chunk>,
}

impl Store {
    /// Create a store that has not been populated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add chunks with their unit vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if `chunks` and `vectors` differ
    /// in length, or the vectors are empty or do not share one dimension.
    /// These are caller bugs; the store is left untouched.
    pub fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(RagError::store(
                BACKEND,
                format!("{} chunks but {} vectors", chunks.len(), vectors.len()),
            ));
        }
        let Some(dimension) = vectors.first().map(Vec::len) else {
            return Ok(());
        };
        if dimension == 0 {
            return Err(RagError::store(BACKEND, "vectors must have at least one dimension"));
        }
        if vectors.iter().any(|v| v.len() != dimension) {
            return Err(RagError::store(BACKEND, "vectors in one batch differ in dimension"));
        }

        let index = match self.index.take() {
            Some(index) if index.dimension() == dimension => index,
            Some(index) => {
                warn!(
                    old_dimension = index.dimension(),
                    new_dimension = dimension,
                    discarded = self.chunks.len(),
                    "embedding dimension changed, resetting store"
                );
                self.chunks.clear();
                VectorIndex::new(dimension)
            }
            None => VectorIndex::new(dimension),
        };
        let index = self.index.insert(index);

        // Dimensions are checked above, so the insert cannot fail halfway.
        index.insert(&vectors)?;
        self.chunks.extend(chunks);

        debug!(total = self.chunks.len(), dimension, "store updated");
        Ok(())
    }

    /// Return up to `top_k` chunks ranked by similarity to `vector`.
    ///
    /// A store that was never populated returns an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if `vector` does not match the
    /// stored dimension.
    pub fn query(&self, vector: &[f32], top_k: usize) -> Result<RetrievalResult> {
        let Some(index) = &self.index else {
            return Ok(RetrievalResult::empty());
        };

        let results = index
            .search(vector, top_k)?
            .into_iter()
            .map(|(handle, score)| SearchResult { chunk: self.chunks[handle].clone(), score })
            .collect();
        Ok(RetrievalResult::new(results))
    }

    /// Discard the index and all metadata.
    pub fn clear(&mut self) {
        self.index = None;
        self.chunks.clear();
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if no chunks are stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimension of the current index, or `None` before the first batch.
    pub fn dimension(&self) -> Option<usize> {
        self.index.as_ref().map(VectorIndex::dimension)
    }

    /// Stored chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}
