//! Deterministic text chunking with overlap
//!
//! Sizes are counted in characters, not bytes, so CJK text gets the same
//! budget as ASCII. The same input always yields the same chunks.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap carried into the next chunk, in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk a document; chunk indices start at 0
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.split_text(&doc.content)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(doc.id.clone(), i as u32, text))
            .collect()
    }

    /// Split text into trimmed, non-empty pieces of at most `chunk_size` characters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        let mut has_new_content = false;

        for piece in self.pieces(text) {
            let piece_len = piece.chars().count();

            if current_len + piece_len > self.chunk_size {
                if has_new_content {
                    push_trimmed(&mut chunks, &current);
                }

                let tail = self.overlap_tail(&current);
                let tail_len = tail.chars().count();
                if has_new_content && tail_len > 0 && tail_len + piece_len <= self.chunk_size {
                    current = tail;
                    current_len = tail_len;
                } else {
                    current.clear();
                    current_len = 0;
                }
                has_new_content = false;
            }

            current.push_str(piece);
            current_len += piece_len;
            has_new_content |= !piece.trim().is_empty();
        }

        if has_new_content {
            push_trimmed(&mut chunks, &current);
        }

        chunks
    }

    /// Sentence pieces, with over-long sentences cut into `chunk_size` windows
    fn pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();

        for sentence in text.split_sentence_bounds() {
            if sentence.chars().count() <= self.chunk_size {
                pieces.push(sentence);
                continue;
            }

            let mut start = 0usize;
            let mut count = 0usize;
            for (byte_idx, _) in sentence.char_indices() {
                if count == self.chunk_size {
                    pieces.push(&sentence[start..byte_idx]);
                    start = byte_idx;
                    count = 0;
                }
                count += 1;
            }
            pieces.push(&sentence[start..]);
        }

        pieces
    }

    /// Trailing `overlap` characters of a chunk, starting at a word boundary when possible
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }

        let total = text.chars().count();
        if total <= self.overlap {
            return text.to_string();
        }

        let skip = total - self.overlap;
        let (start, _) = text
            .char_indices()
            .nth(skip)
            .unwrap_or((text.len(), ' '));
        let tail = &text[start..];

        let starts_mid_word = text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace());

        if starts_mid_word {
            if let Some(pos) = tail.find(char::is_whitespace) {
                return tail[pos..].trim_start().to_string();
            }
        }

        tail.to_string()
    }
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
