//! Result types for retrieval, answering and ingestion

use serde::{Deserialize, Serialize};

use super::document::{Metadata, SOURCE_KEY};

/// Characters kept in a fragment preview
pub const PREVIEW_CHARS: usize = 100;

/// Appended to previews of longer fragments
pub const TRUNCATION_MARKER: &str = "...";

/// A fragment returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFragment {
    /// Fragment text
    pub text: String,
    /// Fragment metadata
    pub metadata: Metadata,
    /// Cosine similarity to the query (higher is more similar)
    pub score: f32,
}

impl RetrievedFragment {
    /// Source path or upload identifier
    pub fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// The question-relevant extraction of a retrieved fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedFragment {
    /// Extracted text
    pub text: String,
    /// Metadata of the fragment it was extracted from
    pub metadata: Metadata,
    /// Similarity score of the retrieved fragment
    pub score: f32,
}

/// A fragment cited by an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedFragment {
    /// `doc_<index>` in retrieval order
    pub id: String,
    /// First characters of the fragment text
    pub preview: String,
}

impl UsedFragment {
    /// Build the citation for the fragment at `index`
    pub fn new(index: usize, text: &str) -> Self {
        Self {
            id: format!("doc_{}", index),
            preview: preview(text),
        }
    }
}

/// Final answer with the fragments it was grounded in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Answer text
    pub answer: String,
    /// Cited fragments, in retrieval order
    pub used_fragments: Vec<UsedFragment>,
}

/// Outcome of one ingestion call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Fragments written to the index
    pub fragment_count: usize,
    /// Documents produced by the loader
    pub document_count: usize,
    /// Distinct `source` values of the written fragments, sorted
    pub sources: Vec<String>,
}

/// First [`PREVIEW_CHARS`] characters of `text`, with a marker when truncated
pub fn preview(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_text() {
        let text = "a".repeat(150);
        let p = preview(&text);
        assert_eq!(p, format!("{}...", "a".repeat(100)));
    }

    #[test]
    fn test_preview_keeps_short_text() {
        let text = "b".repeat(50);
        assert_eq!(preview(&text), text);
    }

    #[test]
    fn test_preview_boundary() {
        let exact = "c".repeat(100);
        assert_eq!(preview(&exact), exact);

        let one_more = "c".repeat(101);
        assert!(preview(&one_more).ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_preview_counts_characters() {
        let text = "ñ".repeat(120);
        let p = preview(&text);
        assert_eq!(p.chars().count(), 100 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_used_fragment_id() {
        let used = UsedFragment::new(3, "short");
        assert_eq!(used.id, "doc_3");
        assert_eq!(used.preview, "short");
    }
}
