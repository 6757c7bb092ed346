//! Local ONNX embeddings via the `fastembed` crate.
//!
//! Uses `sentence-transformers/all-MiniLM-L6-v2` (384 dimensions). The model
//! is downloaded on first use and loaded once in [`FastEmbedProvider::new`];
//! share the provider through an `Arc` rather than constructing it per call.
//!
//! This module is only available when the `fastembed` feature is enabled.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DIMENSIONS: usize = 384;

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::EmbeddingError { provider: "FastEmbed".into(), message: message.into() }
}

/// An [`EmbeddingProvider`] running all-MiniLM-L6-v2 locally.
///
/// Inference is CPU-bound, so batches run on tokio's blocking thread pool.
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedProvider {
    /// Load the model, downloading it on first use.
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);

        let model = TextEmbedding::try_new(opts).map_err(|e| embedding_error(e.to_string()))?;
        info!(model = MODEL_NAME, "embedding model loaded");
        Ok(Self { model: Arc::new(Mutex::new(model)) })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| embedding_error("model returned no embeddings"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = "FastEmbed", batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|_| embedding_error("model lock poisoned"))?;
            model.embed(owned, None).map_err(|e| embedding_error(e.to_string()))
        })
        .await
        .map_err(|e| embedding_error(format!("embedding task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "FastEmbed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires model download, run with: cargo test --features fastembed -- --ignored
    async fn produces_384_dimensional_vectors() {
        let provider = FastEmbedProvider::new().unwrap();
        let vectors = provider.embed_batch(&["glass recycling", "plastic pickup"]).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == DIMENSIONS));
    }
}
