//! Error types for the `docrag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval operations.
///
/// "Nothing to retrieve" is never an error: empty documents, empty stores and
/// empty results are all modeled as successful, empty values.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The store or index was called with inconsistent arguments.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The store component that rejected the call.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion service failed or returned unusable output.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    pub(crate) fn store(backend: &str, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
