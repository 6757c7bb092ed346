//! Completion provider trait for the answer-generation step.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion service: given a prompt, return generated text.
///
/// Calls are made once per answer with no retry. Implementations report
/// transport, provider and parsing failures as
/// [`RagError::CompletionError`](crate::RagError::CompletionError).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate text for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;
}
