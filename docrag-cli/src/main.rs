//! docrag command-line host.
//!
//! # Commands
//!
//! ```bash
//! # Show how a document is split
//! docrag chunk guide.txt --size 700 --overlap 100
//!
//! # Ingest files and list the best matching chunks
//! docrag search "How should plastic be sorted?" guide.txt faq.txt -k 4
//!
//! # Ingest files and answer from them (needs OPENAI_API_KEY)
//! docrag ask "How should plastic be sorted?" guide.txt faq.txt
//! ```
//!
//! Logging follows `RUST_LOG`, e.g. `RUST_LOG=docrag=debug`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use docrag::{
    Answer, Answerer, Chunker, CompletionConfig, EmbeddingProvider, FixedSizeChunker,
    HashingEmbeddingProvider, OpenAICompletionProvider, OpenAIEmbeddingProvider, RagConfig,
    Retriever, SharedStore, SourceFile, shared_store,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docrag")]
#[command(about = "Answer questions from your own documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a document into chunks and print them
    Chunk {
        /// Input file to chunk
        input: PathBuf,

        /// Maximum chunk length in characters
        #[arg(long, default_value_t = docrag::config::DEFAULT_CHUNK_SIZE)]
        size: usize,

        /// Characters shared by consecutive chunks
        #[arg(long, default_value_t = docrag::config::DEFAULT_CHUNK_OVERLAP)]
        overlap: usize,
    },

    /// Ingest files and print the chunks most similar to a query
    Search {
        /// Query text
        query: String,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Ingest files and answer a question grounded in them
    Ask {
        /// Question to answer
        question: String,

        #[command(flatten)]
        corpus: CorpusArgs,

        /// Completion model name
        #[arg(long, env = "DOCRAG_MODEL", default_value = docrag::config::DEFAULT_COMPLETION_MODEL)]
        model: String,

        /// Base URL of an OpenAI-compatible API (e.g. https://api.groq.com/openai/v1)
        #[arg(long, env = "DOCRAG_BASE_URL")]
        base_url: Option<String>,

        /// Seconds to wait for the completion before giving up
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        /// Sentence prepended to the prompt describing the assistant
        #[arg(long)]
        persona: Option<String>,
    },
}

#[derive(Args)]
struct CorpusArgs {
    /// Documents to ingest
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Number of chunks to retrieve
    #[arg(short, long, default_value_t = docrag::config::DEFAULT_TOP_K)]
    k: usize,

    /// Maximum chunk length in characters
    #[arg(long, default_value_t = docrag::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = docrag::config::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Embedding backend
    #[arg(short, long, value_enum, default_value_t = EmbedderKind::Hashing)]
    embedder: EmbedderKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// Offline feature hashing, no model download
    Hashing,
    /// OpenAI embeddings API (needs OPENAI_API_KEY)
    Openai,
    /// Local all-MiniLM-L6-v2 (build with --features fastembed)
    Fastembed,
}

fn embedding_provider(kind: EmbedderKind) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match kind {
        EmbedderKind::Hashing => Arc::new(HashingEmbeddingProvider::default()),
        EmbedderKind::Openai => {
            let mut provider = OpenAIEmbeddingProvider::from_env()?;
            if let Ok(base_url) = std::env::var("DOCRAG_BASE_URL") {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        }
        #[cfg(feature = "fastembed")]
        EmbedderKind::Fastembed => {
            println!("Loading all-MiniLM-L6-v2 (first run downloads the model)...");
            Arc::new(docrag::FastEmbedProvider::new()?)
        }
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::Fastembed => bail!("docrag-cli was built without the `fastembed` feature"),
    };
    Ok(provider)
}

fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(SourceFile::new(source_name(path), bytes))
        })
        .collect()
}

/// The file name shown in citations.
fn source_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    }
}

/// The text printed for an answer; unsuccessful answers become the error.
fn answer_output(answer: &Answer) -> Result<String> {
    if !answer.success {
        bail!("{}", answer.text);
    }
    Ok(answer.render())
}

/// Build a retriever over `corpus.files` and ingest them into a fresh store.
async fn load_corpus(corpus: &CorpusArgs) -> Result<(Arc<Retriever>, SharedStore)> {
    let config = RagConfig::builder()
        .chunk_size(corpus.chunk_size)
        .chunk_overlap(corpus.chunk_overlap)
        .top_k(corpus.k)
        .build()?;
    let retriever = Arc::new(
        Retriever::builder()
            .config(config)
            .embedding_provider(embedding_provider(corpus.embedder)?)
            .build()?,
    );

    let store = shared_store();
    let files = read_sources(&corpus.files)?;
    let summary = retriever.ingest_files(&store, &files).await?;
    if !summary.success {
        bail!("{}", summary.message);
    }
    info!(chunks = summary.added_chunks, files = files.len(), "corpus loaded");
    println!("{}\n", summary.message);

    Ok((retriever, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunk { input, size, overlap } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let chunks = FixedSizeChunker::new(size, overlap).chunk(&source_name(&input), &text);

            println!("Chunked '{}' into {} chunks:\n", input.display(), chunks.len());
            for chunk in &chunks {
                println!("--- {} ({} chars) ---", chunk.id, chunk.text.chars().count());
                let preview: String = chunk.text.chars().take(200).collect();
                let ellipsis = if chunk.text.chars().count() > 200 { "..." } else { "" };
                println!("{preview}{ellipsis}\n");
            }
        }

        Commands::Search { query, corpus } => {
            let (retriever, store) = load_corpus(&corpus).await?;
            let result = retriever.retrieve(&store, &query, corpus.k).await?;

            if result.is_empty() {
                println!("No matches.");
            }
            for (rank, hit) in result.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {} (chunk {})",
                    rank + 1,
                    hit.score,
                    hit.chunk.source_id,
                    hit.chunk.sequence_index
                );
                println!("   {}\n", hit.chunk.text.replace('\n', " "));
            }
        }

        Commands::Ask { question, corpus, model, base_url, timeout, persona } => {
            let mut completion_config = CompletionConfig::default()
                .with_model(model)
                .with_timeout(Duration::from_secs(timeout));
            if let Some(base_url) = base_url {
                completion_config = completion_config.with_base_url(base_url);
            }
            let completion = Arc::new(OpenAICompletionProvider::from_env(completion_config)?);

            let (retriever, store) = load_corpus(&corpus).await?;
            let mut answerer = Answerer::new(retriever, completion)
                .with_timeout(Duration::from_secs(timeout));
            if let Some(persona) = persona {
                answerer = answerer.with_persona(persona);
            }

            let answer = answerer.answer(&store, &question, corpus.k).await;
            println!("{}", answer_output(&answer)?);
        }
    }

    Ok(())
}
