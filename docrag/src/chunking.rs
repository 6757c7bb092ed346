//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], which
//! cuts text into overlapping windows of a fixed number of characters.

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::document::Chunk;

/// A strategy for splitting document text into chunks.
pub trait Chunker: Send + Sync {
    /// Split raw text into trimmed, non-empty segments in document order.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only text.
    fn split(&self, text: &str) -> Vec<String>;

    /// Split text and tag every segment with its source and position.
    fn chunk(&self, source_id: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, segment)| Chunk::new(source_id, i, segment))
            .collect()
    }
}

/// Splits text into fixed-size chunks by character count with overlap.
///
/// Each window starts `chunk_size - chunk_overlap` characters after the
/// previous one. Windows are trimmed and blank windows are dropped, so a
/// chunk can be shorter than `chunk_size` but never longer.
///
/// # Example
///
/// ```rust
/// use docrag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(10, 5);
/// let chunks = chunker.split("0123456789abcdefghij");
/// assert_eq!(chunks, vec!["0123456789", "56789abcde", "abcdefghij", "fghij"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive windows.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size, self.chunk_overlap)
    }
}

/// Cut `text` into overlapping windows of at most `chunk_size` characters.
///
/// Carriage returns become spaces before splitting. Offsets count characters,
/// not bytes. The window always advances by at least one character, so an
/// overlap that is not smaller than `chunk_size` still terminates.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let text = text.replace('\r', " ");
    // Byte offset of every char, plus the end of the string.
    let bounds: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_count = bounds.len() - 1;
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        let window = text[bounds[start]..bounds[end]].trim();
        if !window.is_empty() {
            chunks.push(window.to_string());
        }
        start += step;
    }

    chunks
}
