//! Index construction: chunk every document, embed in batches, insert

use std::sync::Arc;
use std::time::Instant;

use super::index::VectorIndex;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, Document};

/// Builds a [`VectorIndex`] from loaded documents
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    /// Configured dimension, checked against every vector
    expected_dimensions: Option<usize>,
    batch_size: usize,
}

impl IndexBuilder {
    /// Create a new builder
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: TextChunker,
        expected_dimensions: Option<usize>,
        batch_size: usize,
    ) -> Self {
        let expected_dimensions = expected_dimensions.or_else(|| embedder.dimensions());
        Self {
            embedder,
            chunker,
            expected_dimensions,
            batch_size: batch_size.max(1),
        }
    }

    /// Chunk and embed `documents`.
    ///
    /// A vector whose length differs from the established dimension is an
    /// `EmbeddingInconsistency`; embedder failures are wrapped in `IndexBuild`.
    pub async fn build(&self, documents: Vec<Document>) -> Result<VectorIndex> {
        let start = Instant::now();
        let mut index = match self.expected_dimensions {
            Some(dimensions) => VectorIndex::with_dimensions(dimensions),
            None => VectorIndex::new(),
        };

        for document in &documents {
            let chunks = self.chunker.chunk_document(document);
            tracing::debug!("{}: {} chunks", document.id, chunks.len());

            for batch in chunks.chunks(self.batch_size) {
                self.embed_batch(&mut index, batch).await?;
            }
        }

        if index.is_empty() {
            return Err(Error::IndexBuild {
                message: format!("{} documents produced no chunks", documents.len()),
                source: None,
            });
        }

        tracing::info!(
            "Indexed {} chunks from {} documents ({} dimensions) in {:?}",
            index.len(),
            documents.len(),
            index.dimensions().unwrap_or_default(),
            start.elapsed()
        );

        Ok(index)
    }

    async fn embed_batch(&self, index: &mut VectorIndex, batch: &[Chunk]) -> Result<()> {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let first = &batch[0];

        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            Error::index_build(
                format!(
                    "embedding chunks {}..{} of '{}' with {}",
                    first.chunk_index,
                    first.chunk_index as usize + batch.len(),
                    first.document_id,
                    self.embedder.name()
                ),
                e,
            )
        })?;

        if embeddings.len() != batch.len() {
            return Err(Error::IndexBuild {
                message: format!(
                    "{} returned {} embeddings for {} chunks",
                    self.embedder.name(),
                    embeddings.len(),
                    batch.len()
                ),
                source: None,
            });
        }

        for (chunk, embedding) in batch.iter().zip(embeddings) {
            index.insert(chunk.clone(), embedding)?;
        }

        Ok(())
    }
}
