//! In-memory vector index with exact cosine search

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (-1.0 to 1.0, higher is better)
    pub similarity: f32,
}

#[derive(Debug)]
struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
    norm: f32,
}

/// Read-only after construction. Entries keep insertion order, which is
/// the tie-breaker when two chunks score the same.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<Entry>,
    dimensions: Option<usize>,
}

impl VectorIndex {
    /// Create an empty index; the first inserted vector fixes the dimension
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with a known dimension
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimensions: Some(dimensions),
        }
    }

    /// Add a chunk with its embedding
    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        match self.dimensions {
            Some(expected) if expected != embedding.len() => {
                return Err(Error::EmbeddingInconsistency {
                    expected,
                    actual: embedding.len(),
                    context: format!("chunk {} of '{}'", chunk.chunk_index, chunk.document_id),
                });
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }

        let norm = norm(&embedding);
        self.entries.push(Entry {
            chunk,
            embedding,
            norm,
        });
        Ok(())
    }

    /// Top `k` chunks by descending cosine similarity.
    ///
    /// Returns `min(k, len)` results. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if let Some(expected) = self.dimensions {
            if query.len() != expected {
                return Err(Error::EmbeddingInconsistency {
                    expected,
                    actual: query.len(),
                    context: "query".to_string(),
                });
            }
        }

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine(query, query_norm, &entry.embedding, entry.norm)))
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, similarity)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                similarity,
            })
            .collect())
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension, once known
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of distinct source documents
    pub fn document_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.chunk.document_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Chunks in insertion order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc: &str, index: u32, content: &str) -> Chunk {
        Chunk::new(doc.to_string(), index, content.to_string())
    }

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new();
        index.insert(chunk("a.txt", 0, "far away"), vec![0.0, 1.0, 0.0]).unwrap();
        index.insert(chunk("a.txt", 1, "very close"), vec![1.0, 0.0, 0.0]).unwrap();
        index.insert(chunk("b.txt", 0, "medium"), vec![0.5, 0.5, 0.0]).unwrap();
        index
    }

    #[test]
    fn test_cosine_helpers() {
        let similarity = |a: &[f32], b: &[f32]| cosine(a, norm(a), b, norm(b));
        let a = vec![1.0, 0.0, 0.0];
        assert!((similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert!((similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_returns_sorted() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.0, 0.0], 3).unwrap();

        let contents: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(contents, vec!["very close", "medium", "far away"]);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn test_search_result_length_is_min_of_k_and_len() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 100).unwrap().len(), 3);
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = VectorIndex::new();
        for i in 0..5 {
            index
                .insert(chunk("same.txt", i, &format!("copy {}", i)), vec![1.0, 1.0])
                .unwrap();
        }

        let results = index.search(&[1.0, 1.0], 5).unwrap();
        let order: Vec<u32> = results.iter().map(|r| r.chunk.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut index = VectorIndex::new();
        index.insert(chunk("a.txt", 0, "one"), vec![1.0, 0.0]).unwrap();

        let err = index.insert(chunk("b.txt", 0, "two"), vec![1.0, 0.0, 0.0]).unwrap_err();
        match err {
            Error::EmbeddingInconsistency { expected, actual, context } => {
                assert_eq!((expected, actual), (2, 3));
                assert!(context.contains("b.txt"));
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = VectorIndex::with_dimensions(3);
        assert!(matches!(
            index.search(&[1.0], 3),
            Err(Error::EmbeddingInconsistency { expected: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn test_document_count() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.document_count(), 2);
        assert_eq!(index.dimensions(), Some(3));
    }
}
