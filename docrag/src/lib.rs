//! # docrag
//!
//! Document retrieval and grounded question answering.
//!
//! ```text
//! bytes -> TextExtractor -> Chunker -> Embedder -> Store (VectorIndex + chunks)
//!                                                    |
//! query -> Embedder -> Store::query -----------------+
//!                          |
//!                 Retriever::build_context -> prompt -> CompletionProvider -> Answer
//! ```
//!
//! Each session owns one [`Store`] behind a [`SharedStore`] handle; the
//! [`Retriever`] and [`Answerer`] are stateless with respect to the corpus and
//! take the handle on every call.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docrag::{HashingEmbeddingProvider, Retriever, shared_store};
//!
//! # async fn run() -> docrag::Result<()> {
//! let retriever = Retriever::builder()
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .build()?;
//!
//! let store = shared_store();
//! retriever.ingest(&store, "guide.pdf", "Plastic pickup requires sorting by type.").await?;
//!
//! let result = retriever.retrieve(&store, "How should plastic be sorted?", 4).await?;
//! println!("{}", Retriever::build_context(&result));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `openai`: OpenAI-compatible embeddings and chat completions over HTTP.
//! - `fastembed`: local all-MiniLM-L6-v2 embeddings.

pub mod answer;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod hashing;
pub mod index;
pub mod retriever;
pub mod session;
pub mod store;

#[cfg(feature = "fastembed")]
pub mod minilm;
#[cfg(feature = "openai")]
pub mod openai;

pub use answer::{Answer, Answerer, NO_DOCUMENTS_MESSAGE, build_prompt};
pub use chunking::{Chunker, FixedSizeChunker, chunk_text};
pub use completion::CompletionProvider;
pub use config::{CompletionConfig, RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, IngestReport, IngestSummary, RetrievalResult, SearchResult, SourceFile,
};
pub use embedding::{Embedder, EmbeddingProvider, normalize};
pub use error::{RagError, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use hashing::HashingEmbeddingProvider;
pub use index::VectorIndex;
pub use retriever::{Retriever, RetrieverBuilder};
pub use session::{SessionStores, SharedStore, shared_store};
pub use store::Store;

#[cfg(feature = "fastembed")]
pub use minilm::FastEmbedProvider;
#[cfg(feature = "openai")]
pub use openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
