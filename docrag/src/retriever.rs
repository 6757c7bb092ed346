//! Retrieval orchestrator.
//!
//! The [`Retriever`] runs ingestion (extract → chunk → embed → store) and
//! retrieval (embed → search) against a store handle passed in by the caller.
//! It holds no corpus of its own, so one retriever can serve every session.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrag::{HashingEmbeddingProvider, Retriever, shared_store};
//!
//! let retriever = Retriever::builder()
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .build()?;
//!
//! let store = shared_store();
//! retriever.ingest(&store, "guide.pdf", &text).await?;
//! let result = retriever.retrieve(&store, "How should plastic be sorted?", 4).await?;
//! let context = Retriever::build_context(&result);
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, IngestReport, IngestSummary, RetrievalResult, SourceFile};
use crate::embedding::{Embedder, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::session::SharedStore;

/// Coordinates chunking, embedding and store access.
///
/// Construct one via [`Retriever::builder()`].
pub struct Retriever {
    config: RagConfig,
    embedder: Embedder,
    chunker: Arc<dyn Chunker>,
    extractor: Arc<dyn TextExtractor>,
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Ingest one document's extracted text into `store`.
    ///
    /// All chunks are embedded in a single batch. If the text produces no
    /// chunks the store is not touched and `added` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails,
    /// including the source id in the error message.
    pub async fn ingest(
        &self,
        store: &SharedStore,
        source_id: &str,
        raw_text: &str,
    ) -> Result<IngestReport> {
        let chunks = self.chunker.chunk(source_id, raw_text);
        if chunks.is_empty() {
            info!(source_id, chunk_count = 0, "ingested document (no text)");
            return Ok(IngestReport { added: 0 });
        }

        let added = self.embed_and_store(store, chunks).await.map_err(|e| {
            RagError::PipelineError(format!("ingestion failed for '{source_id}': {e}"))
        })?;

        info!(source_id, chunk_count = added, "ingested document");
        Ok(IngestReport { added })
    }

    /// Extract text from raw document bytes, then [`ingest`](Self::ingest) it.
    pub async fn ingest_document(
        &self,
        store: &SharedStore,
        source_id: &str,
        bytes: &[u8],
    ) -> Result<IngestReport> {
        let text = self.extractor.extract_text(bytes);
        self.ingest(store, source_id, &text).await
    }

    /// Ingest a batch of uploaded files in one embedding call.
    ///
    /// Files that yield no text are skipped. If no file yields any text the
    /// summary reports `success: false` and the store is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails.
    pub async fn ingest_files(
        &self,
        store: &SharedStore,
        files: &[SourceFile],
    ) -> Result<IngestSummary> {
        let mut chunks = Vec::new();
        for file in files {
            let text = self.extractor.extract_text(&file.bytes);
            let file_chunks = self.chunker.chunk(&file.source_id, &text);
            if file_chunks.is_empty() {
                info!(source_id = %file.source_id, "no text extracted");
            }
            chunks.extend(file_chunks);
        }

        if chunks.is_empty() {
            return Ok(IngestSummary {
                success: false,
                added_chunks: 0,
                message: "No text extracted from uploaded documents.".to_string(),
            });
        }

        let added = self.embed_and_store(store, chunks).await.map_err(|e| {
            RagError::PipelineError(format!("ingestion of {} files failed: {e}", files.len()))
        })?;

        info!(file_count = files.len(), chunk_count = added, "ingested files");
        Ok(IngestSummary {
            success: true,
            added_chunks: added,
            message: format!("Added {added} chunks from {} files.", files.len()),
        })
    }

    async fn embed_and_store(&self, store: &SharedStore, chunks: Vec<Chunk>) -> Result<usize> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed(&texts).await.map_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
            e
        })?;

        let added = chunks.len();
        store.lock().await.add(chunks, vectors)?;
        Ok(added)
    }

    /// Return the `top_k` chunks most similar to `query`.
    ///
    /// A store that was never populated yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or search fails.
    pub async fn retrieve(
        &self,
        store: &SharedStore,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalResult> {
        let query_embedding = self.embedder.embed_query(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let result = store.lock().await.query(&query_embedding, top_k).map_err(|e| {
            error!(error = %e, "store search failed");
            RagError::PipelineError(format!("search failed: {e}"))
        })?;

        info!(result_count = result.len(), top_k, "query completed");
        Ok(result)
    }

    /// Like [`retrieve`](Self::retrieve) with the configured `top_k`.
    pub async fn retrieve_default(
        &self,
        store: &SharedStore,
        query: &str,
    ) -> Result<RetrievalResult> {
        self.retrieve(store, query, self.config.top_k).await
    }

    /// Format retrieved chunks as grounding material for the completion step.
    ///
    /// One `Source: {source_id}` labeled block per chunk, in rank order,
    /// separated by a blank line.
    pub fn build_context(result: &RetrievalResult) -> String {
        result
            .iter()
            .map(|r| format!("Source: {}\n{}", r.chunk.source_id, r.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builder for constructing a [`Retriever`].
///
/// Only the embedding provider is required. The chunker defaults to a
/// [`FixedSizeChunker`] sized from the config, and the extractor to
/// [`PlainTextExtractor`].
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RagConfig>,
    embedder: Option<Embedder>,
    chunker: Option<Arc<dyn Chunker>>,
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl RetrieverBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider. It is wrapped in a normalizing [`Embedder`].
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(Embedder::new(provider));
        self
    }

    /// Share an already constructed [`Embedder`].
    pub fn embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the text extractor used for raw document bytes.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the [`Retriever`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no embedding provider was set.
    pub fn build(self) -> Result<Retriever> {
        let config = self.config.unwrap_or_default();
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(PlainTextExtractor));

        Ok(Retriever { config, embedder, chunker, extractor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SearchResult;
    use crate::hashing::HashingEmbeddingProvider;
    use crate::session::shared_store;

    fn retriever() -> Retriever {
        Retriever::builder()
            .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_embedder() {
        assert!(matches!(Retriever::builder().build(), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn context_blocks_are_labeled_and_rank_ordered() {
        let result = RetrievalResult::new(vec![
            SearchResult { chunk: Chunk::new("b.pdf", 0, "Second doc."), score: 0.9 },
            SearchResult { chunk: Chunk::new("a.pdf", 4, "First doc."), score: 0.5 },
        ]);
        assert_eq!(
            Retriever::build_context(&result),
            "Source: b.pdf\nSecond doc.\n\nSource: a.pdf\nFirst doc."
        );
    }

    #[test]
    fn empty_result_gives_empty_context() {
        assert_eq!(Retriever::build_context(&RetrievalResult::empty()), "");
    }

    #[tokio::test]
    async fn empty_text_adds_nothing_and_leaves_store_unpopulated() {
        let retriever = retriever();
        let store = shared_store();
        let report = retriever.ingest(&store, "scan.pdf", "").await.unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(store.lock().await.dimension(), None);
    }

    #[tokio::test]
    async fn ingest_tags_source_and_sequence() {
        let retriever = Retriever::builder()
            .config(RagConfig::builder().chunk_size(10).chunk_overlap(0).build().unwrap())
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(16)))
            .build()
            .unwrap();
        let store = shared_store();

        let report =
            retriever.ingest(&store, "notes.txt", "0123456789abcdefghij").await.unwrap();
        assert_eq!(report.added, 2);

        let guard = store.lock().await;
        let chunks = guard.chunks();
        assert_eq!(chunks[0].id, "notes.txt_0");
        assert_eq!(chunks[1].sequence_index, 1);
        assert_eq!(guard.dimension(), Some(16));
    }

    #[tokio::test]
    async fn ingest_files_reports_when_nothing_was_extracted() {
        let retriever = retriever();
        let store = shared_store();
        let files = vec![SourceFile::new("blank.pdf", Vec::new())];

        let summary = retriever.ingest_files(&store, &files).await.unwrap();
        assert!(!summary.success);
        assert_eq!(summary.added_chunks, 0);
        assert!(store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn ingest_files_embeds_all_files_together() {
        let retriever = retriever();
        let store = shared_store();
        let files = vec![
            SourceFile::new("a.txt", "Glass goes in the green bin."),
            SourceFile::new("empty.txt", "   "),
            SourceFile::new("b.txt", "Batteries need a special pickup."),
        ];

        let summary = retriever.ingest_files(&store, &files).await.unwrap();
        assert!(summary.success);
        assert_eq!(summary.added_chunks, 2);

        let result = retriever.retrieve(&store, "battery pickup special", 1).await.unwrap();
        assert_eq!(result.sources(), vec!["b.txt"]);
    }

    #[tokio::test]
    async fn ingest_document_runs_the_extractor() {
        let shout = |bytes: &[u8]| String::from_utf8_lossy(bytes).to_uppercase();
        let retriever = Retriever::builder()
            .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
            .extractor(Arc::new(shout))
            .build()
            .unwrap();
        let store = shared_store();

        retriever.ingest_document(&store, "memo.txt", b"compost weekly").await.unwrap();
        assert_eq!(store.lock().await.chunks()[0].text, "COMPOST WEEKLY");
    }
}
