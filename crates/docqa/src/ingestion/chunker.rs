//! Recursive character chunking with overlap

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Document, Fragment};

/// Separators tried in order, coarsest first; `""` splits into characters
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits documents into overlapping fragments of at most `chunk_size` characters
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker, rejecting sizes it cannot honour
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    /// Chunk every document; each fragment gets its own copy of the parent metadata
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Fragment> {
        let mut fragments = Vec::new();

        for doc in documents {
            let chunks = self.split_text(&doc.content);
            tracing::debug!("{} -> {} fragments", doc.source(), chunks.len());

            fragments.extend(chunks.into_iter().map(|text| Fragment {
                text,
                metadata: doc.metadata.clone(),
            }));
        }

        fragments
    }

    /// Split raw text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();

        // First separator present in the text; finer ones are kept for oversized pieces
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut pending: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Greedily join pieces up to `chunk_size`, carrying at most `overlap` characters forward
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut start = 0usize;
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && start < window.len() {
                push_trimmed(&mut chunks, &window[start..]);

                while start < window.len()
                    && (total > self.overlap || (total + len > self.chunk_size && total > 0))
                {
                    total -= window[start].1;
                    start += 1;
                }
            }

            window.push((piece, len));
            total += len;
        }

        push_trimmed(&mut chunks, &window[start..]);
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, window: &[(&str, usize)]) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, keeping each separator attached to the piece that follows it
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(ChunkingConfig::new(size, overlap)).unwrap()
    }

    #[test]
    fn test_sentence_pair() {
        let chunks = chunker(20, 5).split_text("The sky is blue. Grass is green.");
        assert_eq!(chunks, vec!["The sky is blue.", "Grass is green."]);
    }

    #[test]
    fn test_overlap_carries_words_forward() {
        let chunks = chunker(10, 5).split_text("aaaa bbbb cccc dddd eeee");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc", "cccc dddd", "dddd eeee"]);
    }

    #[test]
    fn test_paragraphs_split_first() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = chunker(30, 0).split_text(text);
        assert_eq!(chunks, vec!["First paragraph here.", "Second paragraph here."]);
    }

    #[test]
    fn test_long_word_split_into_characters() {
        let chunks = chunker(4, 0).split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunker(1000, 200).split_text("  Just one line.  ");
        assert_eq!(chunks, vec!["Just one line."]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        let c = chunker(100, 10);
        assert!(c.split_text("").is_empty());
        assert!(c.split_text(" \n\n \n ").is_empty());
    }

    #[test]
    fn test_multibyte_counted_as_characters() {
        let chunks = chunker(5, 0).split_text("ñññññññññ");
        assert_eq!(chunks, vec!["ñññññ", "ññññ"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(TextChunker::new(ChunkingConfig::new(10, 10)).is_err());
        assert!(TextChunker::new(ChunkingConfig::new(0, 0)).is_err());
    }

    #[test]
    fn test_metadata_copied_to_fragments() {
        let docs = vec![
            Document::new("alpha beta gamma delta", "/a.txt").with_metadata("page", "2"),
            Document::new("", "/empty.txt"),
        ];
        let fragments = chunker(17, 0).split_documents(&docs);

        assert_eq!(fragments.len(), 2);
        for f in &fragments {
            assert_eq!(f.source(), "/a.txt");
            assert_eq!(f.metadata.get("page").map(String::as_str), Some("2"));
        }
    }

    proptest! {
        #[test]
        fn prop_fragments_bounded_and_cover_words(
            words in prop::collection::vec("[a-z]{1,8}", 1..60),
            newline_every in 2usize..9,
            size in 20usize..80,
            overlap_pct in 0usize..50,
        ) {
            let overlap = size * overlap_pct / 100;
            let text: String = words
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let sep = if i == 0 { "" } else if i % newline_every == 0 { "\n" } else { " " };
                    format!("{}{}", sep, w)
                })
                .collect();

            let chunks = chunker(size, overlap).split_text(&text);

            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= size);
                prop_assert!(!chunk.is_empty());
                prop_assert_eq!(chunk.trim(), chunk.as_str());
            }
            for word in &words {
                prop_assert!(chunks.iter().any(|c| c.contains(word.as_str())));
            }
            let first_word = words[0].as_str();
            prop_assert!(chunks[0].starts_with(first_word));
        }
    }
}
