//! OpenAI-compatible HTTP providers.
//!
//! [`OpenAIEmbeddingProvider`] calls `/embeddings` and
//! [`OpenAICompletionProvider`] calls `/chat/completions`. Both accept any
//! OpenAI-compatible base URL (OpenAI, Groq, a local server, ...).
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::CompletionProvider;
use crate::config::CompletionConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Output size of `text-embedding-3-small`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

fn api_key_from_env() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Which error variant a failed call maps to.
#[derive(Clone, Copy)]
enum Call {
    Embedding,
    Completion,
}

impl Call {
    fn error(self, message: impl Into<String>) -> RagError {
        let provider = PROVIDER.to_string();
        let message = message.into();
        match self {
            Call::Embedding => RagError::EmbeddingError { provider, message },
            Call::Completion => RagError::CompletionError { provider, message },
        }
    }
}

/// Authenticated JSON client for one API base URL.
struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ApiClient {
    fn new(http: reqwest::Client, api_key: String, call: Call) -> Result<Self> {
        if api_key.is_empty() {
            return Err(call.error("API key must not be empty"));
        }
        Ok(Self { http, api_key, base_url: OPENAI_API_BASE.to_string() })
    }

    async fn post<B, R>(&self, path: &str, body: &B, call: Call) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, path);
        let response =
            self.http.post(&url).bearer_auth(&self.api_key).json(body).send().await.map_err(
                |e| {
                    error!(provider = PROVIDER, url = %url, error = %e, "request failed");
                    call.error(format!("request failed: {e}"))
                },
            )?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, detail = %detail, "API error");
            return Err(call.error(format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            call.error(format!("failed to parse response: {e}"))
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// Defaults to `text-embedding-3-small`. All texts of a batch go out in one
/// request.
///
/// ```rust,ignore
/// use docrag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::from_env()?.with_dimensions(512);
/// let vectors = provider.embed_batch(&["glass", "plastic"]).await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    api: ApiClient,
    model: String,
    dimensions: usize,
    requested_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(reqwest::Client::new(), api_key.into(), Call::Embedding)?,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            requested_dimensions: None,
        })
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env()
            .ok_or_else(|| Call::Embedding.error("OPENAI_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Use another embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send requests to an OpenAI-compatible API at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Ask the API to shorten vectors to `dims` components.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.requested_dimensions = Some(dims);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| Call::Embedding.error("API returned no embeddings"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, model = %self.model, batch_size = texts.len(), "embedding batch");

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions,
        };
        let response: EmbeddingResponse =
            self.api.post("embeddings", &request, Call::Embedding).await?;

        let mut items = response.data;
        items.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// ── Chat completions ───────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// A [`CompletionProvider`] backed by an OpenAI-compatible chat completions API.
///
/// The prompt is sent as a single user message with the model, token limit
/// and temperature from [`CompletionConfig`]. The config timeout, if any,
/// bounds each HTTP request.
///
/// ```rust,ignore
/// use docrag::{CompletionConfig, openai::OpenAICompletionProvider};
///
/// let config = CompletionConfig::default().with_base_url("https://api.groq.com/openai/v1");
/// let provider = OpenAICompletionProvider::new(std::env::var("GROQ_API_KEY")?, config)?;
/// let text = provider.complete("Say hello").await?;
/// ```
pub struct OpenAICompletionProvider {
    api: ApiClient,
    config: CompletionConfig,
}

impl OpenAICompletionProvider {
    /// Create a provider authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>, config: CompletionConfig) -> Result<Self> {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| Call::Completion.error(format!("failed to build HTTP client: {e}")))?;

        let mut api = ApiClient::new(http, api_key.into(), Call::Completion)?;
        if let Some(base_url) = &config.base_url {
            api.base_url = base_url.clone();
        }
        Ok(Self { api, config })
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(config: CompletionConfig) -> Result<Self> {
        let api_key = api_key_from_env()
            .ok_or_else(|| Call::Completion.error("OPENAI_API_KEY environment variable not set"))?;
        Self::new(api_key, config)
    }

    /// The generation settings in use.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "requesting completion"
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        let response: ChatResponse =
            self.api.post("chat/completions", &request, Call::Completion).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Call::Completion.error("response contained no message content"))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
