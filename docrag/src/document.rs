//! Data types for chunks, search results and ingestion reports.

use serde::{Deserialize, Serialize};

/// A trimmed, contiguous slice of a source document's text.
///
/// Chunks are the unit of embedding and retrieval. They never carry their
/// vector: the [`Store`](crate::Store) keeps vectors in its index, aligned by
/// position with the chunk sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Identifier of the form `{source_id}_{sequence_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Identifier of the originating document, e.g. a filename.
    pub source_id: String,
    /// Position among the chunks produced from the same source.
    pub sequence_index: usize,
}

impl Chunk {
    /// Create a chunk, deriving its id from the source and position.
    pub fn new(
        source_id: impl Into<String>,
        sequence_index: usize,
        text: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        Self {
            id: format!("{source_id}_{sequence_index}"),
            text: text.into(),
            source_id,
            sequence_index,
        }
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// Ranked search results, best match first.
///
/// There is no minimum score: callers decide what counts as relevant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RetrievalResult {
    results: Vec<SearchResult>,
}

impl RetrievalResult {
    /// Wrap results that are already sorted by descending score.
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self { results }
    }

    /// A result with no matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of retrieved chunks.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over results in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    /// The ranked results.
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Distinct source identifiers in order of first appearance.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for result in &self.results {
            if !sources.contains(&result.chunk.source_id) {
                sources.push(result.chunk.source_id.clone());
            }
        }
        sources
    }

    /// Consume the wrapper and return the ranked results.
    pub fn into_inner(self) -> Vec<SearchResult> {
        self.results
    }
}

impl IntoIterator for RetrievalResult {
    type Item = SearchResult;
    type IntoIter = std::vec::IntoIter<SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Outcome of ingesting one source document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of chunks added to the store. Zero means no text was found.
    pub added: usize,
}

/// A document handed over by the host, e.g. an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Identifier recorded on every chunk, usually the file name.
    pub source_id: String,
    /// Raw document bytes, passed to the text extractor.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a source file from a name and its raw bytes.
    pub fn new(source_id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { source_id: source_id.into(), bytes: bytes.into() }
    }
}

/// Outcome of ingesting a batch of uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSummary {
    /// `false` when none of the files yielded any text.
    pub success: bool,
    /// Total number of chunks added across all files.
    pub added_chunks: usize,
    /// Human-readable status line.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(source: &str, index: usize, score: f32) -> SearchResult {
        SearchResult { chunk: Chunk::new(source, index, "text"), score }
    }

    #[test]
    fn chunk_id_combines_source_and_position() {
        let chunk = Chunk::new("guide.pdf", 3, "hello");
        assert_eq!(chunk.id, "guide.pdf_3");
        assert_eq!(chunk.sequence_index, 3);
    }

    #[test]
    fn sources_are_distinct_and_rank_ordered() {
        let retrieved = RetrievalResult::new(vec![
            result("b.pdf", 0, 0.9),
            result("a.pdf", 2, 0.8),
            result("b.pdf", 1, 0.7),
            result("c.pdf", 0, 0.1),
        ]);
        assert_eq!(retrieved.sources(), vec!["b.pdf", "a.pdf", "c.pdf"]);
    }

    #[test]
    fn empty_result_has_no_sources() {
        let retrieved = RetrievalResult::empty();
        assert!(retrieved.is_empty());
        assert!(retrieved.sources().is_empty());
    }
}
