//! End-to-end tests for ingestion, retrieval and answering.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docrag::{
    Answerer, CompletionProvider, EmbeddingProvider, HashingEmbeddingProvider,
    NO_DOCUMENTS_MESSAGE, RagConfig, RagError, Retriever, SessionStores, shared_store,
};
use tokio::sync::Mutex;

const GLASS: &str = "Recycling glass reduces landfill waste.";
const PLASTIC: &str = "Plastic pickup requires sorting by type.";

/// Records every prompt and answers with a fixed text.
#[derive(Default)]
struct RecordingCompletion {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(&self, prompt: &str) -> docrag::Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        Ok("  Sort plastic by type before pickup.\n".to_string())
    }

    fn name(&self) -> &str {
        "Recording"
    }
}

struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> docrag::Result<String> {
        Err(RagError::CompletionError {
            provider: "Failing".into(),
            message: "503 service unavailable".into(),
        })
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

struct SlowCompletion;

#[async_trait]
impl CompletionProvider for SlowCompletion {
    async fn complete(&self, _prompt: &str) -> docrag::Result<String> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("too late".to_string())
    }

    fn name(&self) -> &str {
        "Slow"
    }
}

/// Embedding provider whose calls always fail.
struct BrokenEmbedding {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for BrokenEmbedding {
    async fn embed(&self, _text: &str) -> docrag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::EmbeddingError { provider: "Broken".into(), message: "timeout".into() })
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

/// Two-sentence document whose sentences land in separate 40-character chunks.
fn guide_text() -> String {
    format!("{GLASS} {PLASTIC}")
}

fn retriever_with(dimensions: usize) -> Arc<Retriever> {
    let config = RagConfig::builder().chunk_size(40).chunk_overlap(0).build().unwrap();
    Arc::new(
        Retriever::builder()
            .config(config)
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(dimensions)))
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn plastic_question_retrieves_plastic_chunk_and_cites_guide() {
    let retriever = retriever_with(384);
    let store = shared_store();

    let report = retriever.ingest(&store, "guide.pdf", &guide_text()).await.unwrap();
    assert_eq!(report.added, 2);

    let result = retriever.retrieve(&store, "How should plastic be sorted?", 1).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.results()[0].chunk.text, PLASTIC);

    let completion = Arc::new(RecordingCompletion::default());
    let answerer = Answerer::new(Arc::clone(&retriever), completion.clone());
    let answer = answerer.answer(&store, "How should plastic be sorted?", 1).await;

    assert!(answer.success);
    assert_eq!(answer.text, "Sort plastic by type before pickup.");
    assert_eq!(answer.sources, vec!["guide.pdf"]);

    let prompts = completion.prompts.lock().await;
    assert_eq!(prompts.len(), 1, "completion must be called exactly once");
    assert!(prompts[0].contains(&format!("Source: guide.pdf\n{PLASTIC}")));
    assert!(!prompts[0].contains(GLASS));
    assert!(prompts[0].contains("User question: How should plastic be sorted?"));
}

#[tokio::test]
async fn retrieval_with_large_top_k_returns_all_chunks_ranked() {
    let retriever = retriever_with(384);
    let store = shared_store();
    retriever.ingest(&store, "guide.pdf", &guide_text()).await.unwrap();

    let result = retriever.retrieve(&store, "plastic sorting", 10).await.unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.results()[0].chunk.text, PLASTIC);
    assert!(result.results()[0].score >= result.results()[1].score);
    assert_eq!(result.sources(), vec!["guide.pdf"]);
}

#[tokio::test]
async fn unpopulated_store_gives_empty_result_and_unsuccessful_answer() {
    let retriever = retriever_with(64);
    let store = shared_store();

    assert!(retriever.retrieve(&store, "anything", 4).await.unwrap().is_empty());

    let completion = Arc::new(RecordingCompletion::default());
    let answerer = Answerer::new(retriever, completion.clone());
    let answer = answerer.answer(&store, "anything", 4).await;

    assert!(!answer.success);
    assert_eq!(answer.text, NO_DOCUMENTS_MESSAGE);
    assert!(answer.sources.is_empty());
    assert!(completion.prompts.lock().await.is_empty());
}

#[tokio::test]
async fn embedding_dimension_change_discards_earlier_documents() {
    let store = shared_store();
    retriever_with(64).ingest(&store, "old.pdf", &guide_text()).await.unwrap();

    let retriever = retriever_with(128);
    retriever.ingest(&store, "new.pdf", PLASTIC).await.unwrap();

    assert_eq!(store.lock().await.len(), 1);
    let result = retriever.retrieve(&store, "plastic", 10).await.unwrap();
    assert_eq!(result.sources(), vec!["new.pdf"]);
}

#[tokio::test]
async fn completion_failure_becomes_unsuccessful_answer() {
    let retriever = retriever_with(384);
    let store = shared_store();
    retriever.ingest(&store, "guide.pdf", &guide_text()).await.unwrap();

    let answerer = Answerer::new(retriever, Arc::new(FailingCompletion));
    let answer = answerer.answer(&store, "plastic?", 4).await;

    assert!(!answer.success);
    assert!(answer.text.contains("503 service unavailable"));
    assert!(answer.sources.is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_completion_times_out() {
    let retriever = retriever_with(384);
    let store = shared_store();
    retriever.ingest(&store, "guide.pdf", &guide_text()).await.unwrap();

    let answerer =
        Answerer::new(retriever, Arc::new(SlowCompletion)).with_timeout(Duration::from_secs(5));
    let answer = answerer.answer(&store, "plastic?", 4).await;

    assert!(!answer.success);
    assert!(answer.text.contains("timed out"));
}

#[tokio::test]
async fn embedding_failure_is_reported_not_raised() {
    let provider = Arc::new(BrokenEmbedding { calls: AtomicUsize::new(0) });
    let retriever =
        Arc::new(Retriever::builder().embedding_provider(provider.clone()).build().unwrap());
    let store = shared_store();

    let err = retriever.ingest(&store, "guide.pdf", PLASTIC).await.unwrap_err();
    assert!(matches!(err, RagError::PipelineError(_)));
    assert!(store.lock().await.is_empty());

    let answerer = Answerer::new(retriever, Arc::new(RecordingCompletion::default()));
    let answer = answerer.answer(&store, "plastic?", 4).await;
    assert!(!answer.success);
    assert!(answer.text.starts_with("Failed to search documents"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_ingestion_in_one_session_keeps_store_aligned() {
    let retriever = retriever_with(128);
    let sessions = Arc::new(SessionStores::new());

    let mut handles = Vec::new();
    for i in 0..8 {
        let retriever = Arc::clone(&retriever);
        let sessions = Arc::clone(&sessions);
        handles.push(tokio::spawn(async move {
            let store = sessions.get_or_create("chat-1").await;
            let text = format!("Document {i} covers pickup route {i}.");
            retriever.ingest(&store, &format!("doc{i}.txt"), &text).await.unwrap().added
        }));
    }

    let mut added = 0;
    for handle in handles {
        added += handle.await.unwrap();
    }

    let store = sessions.get_or_create("chat-1").await;
    let result = retriever.retrieve(&store, "pickup route", 100).await.unwrap();
    assert_eq!(result.len(), added);
    assert_eq!(store.lock().await.len(), added);
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn rendered_answer_lists_sources() {
    let retriever = retriever_with(384);
    let store = shared_store();
    retriever.ingest(&store, "guide.pdf", &guide_text()).await.unwrap();

    let answerer = Answerer::new(retriever, Arc::new(RecordingCompletion::default()))
        .with_persona("You are the recycling assistant.");
    let answer = answerer.answer_default(&store, "How should plastic be sorted?").await;
    assert!(answer.render().ends_with("\n\nSources: guide.pdf"));
}
