//! Text extraction from raw document bytes.
//!
//! Extraction is supplied by the host application (PDF, DOCX, ...). It is
//! best effort: a document that yields nothing produces an empty string,
//! never an error, and ingestion then reports zero added chunks.

/// Turns raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract text from `bytes`, or return an empty string.
    fn extract_text(&self, bytes: &[u8]) -> String;
}

impl<F> TextExtractor for F
where
    F: Fn(&[u8]) -> String + Send + Sync,
{
    fn extract_text(&self, bytes: &[u8]) -> String {
        self(bytes)
    }
}

/// Treats the bytes as UTF-8 text, replacing invalid sequences.
///
/// NUL bytes are dropped so that binary files do not produce chunks of
/// control characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).chars().filter(|c| *c != '\0').collect()
    }
}
