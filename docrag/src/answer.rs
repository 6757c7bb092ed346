//! Grounded answer generation.
//!
//! The [`Answerer`] retrieves context for a question, wraps it in a prompt
//! that restricts the model to that context, and makes exactly one call to
//! the completion service. It never returns an error: every failure becomes
//! an [`Answer`] with `success: false` and a readable reason.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::completion::CompletionProvider;
use crate::error::{RagError, Result};
use crate::retriever::Retriever;
use crate::session::SharedStore;

/// Message returned when the store has nothing to search.
pub const NO_DOCUMENTS_MESSAGE: &str = "No documents found. Please upload documents first.";

/// The outcome of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    /// `false` when nothing was retrieved or a service call failed.
    pub success: bool,
    /// The generated answer, or the reason there is none.
    pub text: String,
    /// Distinct source ids of the retrieved chunks, best match first.
    pub sources: Vec<String>,
}

impl Answer {
    fn failure(text: impl Into<String>) -> Self {
        Self { success: false, text: text.into(), sources: Vec::new() }
    }

    /// The answer text followed by a `Sources:` line when there are sources.
    pub fn render(&self) -> String {
        if self.sources.is_empty() {
            self.text.clone()
        } else {
            format!("{}\n\nSources: {}", self.text, self.sources.join(", "))
        }
    }
}

/// Compose the completion prompt for `query` grounded in `context`.
pub fn build_prompt(persona: Option<&str>, context: &str, query: &str) -> String {
    let mut prompt = String::new();
    if let Some(persona) = persona {
        prompt.push_str(persona.trim());
        prompt.push(' ');
    }
    prompt.push_str(
        "Use ONLY the following document snippets to answer. \
         If the answer is not found in the text, say you don't know.\n\n",
    );
    prompt.push_str(&format!("Context:\n{context}\n\n"));
    prompt.push_str(&format!("User question: {query}\n\n"));
    prompt.push_str("Answer concisely and cite sources:");
    prompt
}

/// Answers questions from retrieved document chunks.
pub struct Answerer {
    retriever: Arc<Retriever>,
    completion: Arc<dyn CompletionProvider>,
    persona: Option<String>,
    timeout: Option<Duration>,
}

impl Answerer {
    /// Create an answerer over a shared retriever and completion provider.
    pub fn new(retriever: Arc<Retriever>, completion: Arc<dyn CompletionProvider>) -> Self {
        Self { retriever, completion, persona: None, timeout: None }
    }

    /// Prefix every prompt with an assistant description, e.g. "You are the support assistant."
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Abort the completion call after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The retriever used for context lookup.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Answer `query` from the `top_k` best chunks in `store`.
    pub async fn answer(&self, store: &SharedStore, query: &str, top_k: usize) -> Answer {
        let result = match self.retriever.retrieve(store, query, top_k).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return Answer::failure(format!("Failed to search documents: {e}"));
            }
        };

        if result.is_empty() {
            info!("no documents to answer from");
            return Answer::failure(NO_DOCUMENTS_MESSAGE);
        }

        let context = Retriever::build_context(&result);
        let prompt = build_prompt(self.persona.as_deref(), &context, query);
        let sources = result.sources();

        match self.complete(&prompt).await {
            Ok(text) => {
                info!(source_count = sources.len(), "answer generated");
                Answer { success: true, text, sources }
            }
            Err(e) => {
                error!(provider = self.completion.name(), error = %e, "completion failed");
                Answer::failure(format!("Failed to generate an answer: {e}"))
            }
        }
    }

    /// Like [`answer`](Self::answer) with the retriever's configured `top_k`.
    pub async fn answer_default(&self, store: &SharedStore, query: &str) -> Answer {
        self.answer(store, query, self.retriever.config().top_k).await
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let provider = self.completion.name();
        let call = self.completion.complete(prompt);
        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(provider, timeout_ms = limit.as_millis() as u64, "completion timed out");
                RagError::CompletionError {
                    provider: provider.to_string(),
                    message: format!("timed out after {limit:?}"),
                }
            })??,
            None => call.await?,
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(RagError::CompletionError {
                provider: provider.to_string(),
                message: "returned an empty answer".to_string(),
            });
        }
        Ok(text.to_string())
    }
}
