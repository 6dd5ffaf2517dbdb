//! Deterministic feature-hashing embedder
//!
//! Lets the service run (and be tested) without a model server. Lower-cased
//! word tokens and CJK characters (plus adjacent CJK pairs) are hashed into
//! a fixed number of signed buckets, then L2-normalized.

use async_trait::async_trait;
use std::hash::{DefaultHasher, Hash, Hasher};

use super::embedding::EmbeddingProvider;
use crate::error::Result;

/// Bag-of-tokens embedder using the hashing trick
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Dimensions used when none are configured
    pub const DEFAULT_DIMENSIONS: usize = 384;

    /// Create a new embedder; `dimensions` of 0 falls back to the default
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: if dimensions == 0 {
                Self::DEFAULT_DIMENSIONS
            } else {
                dimensions
            },
        }
    }

    /// Embed synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();

            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF   // Hiragana, Katakana
        | 0x3400..=0x4DBF // CJK Extension A
        | 0x4E00..=0x9FFF // CJK Unified Ideographs
        | 0xAC00..=0xD7AF // Hangul syllables
        | 0xF900..=0xFAFF)
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut prev_cjk: Option<char> = None;

    for c in text.chars() {
        if is_cjk(c) {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            tokens.push(c.to_string());
            if let Some(prev) = prev_cjk {
                tokens.push(format!("{}{}", prev, c));
            }
            prev_cjk = Some(c);
            continue;
        }

        prev_cjk = None;
        if c.is_alphanumeric() {
            word.extend(c.to_lowercase());
        } else if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
    }

    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_tokenize_mixed_text() {
        assert_eq!(tokenize("What is X?"), vec!["what", "is", "x"]);
        assert_eq!(tokenize("RAG检索"), vec!["rag", "检", "索", "检索"]);
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_text("X is a protocol for Y");
        let b = embedder.embed_text("X is a protocol for Y");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_related_text_scores_higher() {
        let embedder = HashingEmbedder::default();
        let question = embedder.embed_text("What is X?");
        let related = embedder.embed_text("X is a protocol for Y");
        let unrelated = embedder.embed_text("Bananas grow in tropical climates");

        assert!(cosine(&question, &related) > cosine(&question, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed_text("  ?! ").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_provider_reports_dimensions() {
        let embedder = HashingEmbedder::new(0);
        assert_eq!(embedder.dimensions(), Some(HashingEmbedder::DEFAULT_DIMENSIONS));
        assert_eq!(embedder.embed("hello").await.unwrap().len(), 384);
    }
}
