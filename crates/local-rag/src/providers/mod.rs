//! Provider abstractions for the embedding model and the generator
//!
//! The retrieval pipeline only talks to these traits; model serving lives
//! behind them (Ollama over HTTP, or the in-process hashing embedder).

pub mod embedding;
pub mod hashing;
pub mod llm;
pub mod ollama;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use hashing::HashingEmbedder;
pub use llm::{GenerationParams, LlmProvider};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};

/// Build the embedder and generator selected by configuration
pub fn from_config(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    let client = Arc::new(OllamaClient::new(&config.llm)?);

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
        EmbeddingBackend::Ollama => {
            tracing::info!("Using Ollama embeddings ({})", config.llm.embed_model);
            Arc::new(OllamaEmbedder::new(
                Arc::clone(&client),
                config.llm.embed_model.clone(),
                config.embeddings.dimensions,
            ))
        }
        EmbeddingBackend::Hashing => {
            let dimensions = config
                .embeddings
                .dimensions
                .unwrap_or(HashingEmbedder::DEFAULT_DIMENSIONS);
            tracing::info!("Using hashing embeddings ({} dimensions)", dimensions);
            Arc::new(HashingEmbedder::new(dimensions))
        }
    };

    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::new(
        client,
        config.llm.generate_model.clone(),
    ));

    Ok((embedder, llm))
}
