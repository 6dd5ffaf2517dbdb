//! Application state for the RAG server

use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::query_engine::QueryEngine;
use crate::types::ServiceStatus;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Embedding provider used to build the index and embed questions
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// LLM provider for answer generation
    llm_provider: Arc<dyn LlmProvider>,
    /// Set exactly once when the index is built
    engine: OnceCell<Arc<QueryEngine>>,
}

impl AppState {
    /// Create state that is not ready yet
    pub fn new(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                embedding_provider,
                llm_provider,
                engine: OnceCell::new(),
            }),
        }
    }

    /// Build the index and mark the state ready
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!(
            "Initializing query engine from {}...",
            self.inner.config.documents.dir.display()
        );

        let engine = QueryEngine::bootstrap(
            &self.inner.config,
            Arc::clone(&self.inner.embedding_provider),
            Arc::clone(&self.inner.llm_provider),
        )
        .await?;

        self.mark_ready(engine)
    }

    /// Install the query engine. Happens once; a second call is an error.
    pub fn mark_ready(&self, engine: QueryEngine) -> Result<()> {
        self.inner
            .engine
            .set(Arc::new(engine))
            .map_err(|_| Error::internal("query engine is already initialized"))?;
        tracing::info!("RAG service is ready");
        Ok(())
    }

    /// Check if the service is ready
    pub fn is_ready(&self) -> bool {
        self.inner.engine.get().is_some()
    }

    /// Current observable status
    pub fn status(&self) -> ServiceStatus {
        if self.is_ready() {
            ServiceStatus::Ready
        } else {
            ServiceStatus::Initializing
        }
    }

    /// Get the query engine, or `ServiceUnavailable` while initializing
    pub fn engine(&self) -> Result<Arc<QueryEngine>> {
        self.inner.engine.get().cloned().ok_or_else(|| {
            Error::ServiceUnavailable("the document index is still being built".to_string())
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get embedding provider
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    /// Get LLM provider
    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }
}
