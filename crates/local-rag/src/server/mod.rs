//! HTTP server for the RAG system

pub mod routes;
pub mod state;

use axum::Router;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use state::AppState;

/// RAG HTTP Server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server with the providers selected by configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        let (embedder, llm) = providers::from_config(&config)?;
        Ok(Self::with_providers(config, embedder, llm))
    }

    /// Create a server with explicit providers
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let state = AppState::new(config.clone(), embedder, llm);
        Self { config, state }
    }

    /// Shared state handed to request handlers
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = routes::routes()
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Build the index and serve until Ctrl-C.
    ///
    /// By default the index is built before binding, so a failed
    /// initialization never listens. With `serve_during_init` the listener
    /// comes up first and an initialization failure stops it.
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;
        let serve_during_init = self.config.server.serve_during_init;

        if !serve_during_init {
            self.state.initialize().await?;
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener).await
    }

    /// Serve on a bound listener until Ctrl-C.
    ///
    /// If the index is not built yet it is built while connections are
    /// accepted; an initialization failure stops the server.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> Result<()> {
        tracing::info!("Starting RAG server on http://{}", listener.local_addr()?);

        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        if self.state.is_ready() {
            return server
                .await
                .map_err(|e| Error::Internal(format!("Server error: {}", e)));
        }

        tracing::info!("Accepting connections while the index is built");
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                return result.map_err(|e| Error::Internal(format!("Server error: {}", e)));
            }
            init = self.state.initialize() => {
                if let Err(e) = init {
                    tracing::error!("Initialization failed, shutting down: {}", e);
                    return Err(e);
                }
            }
        }

        server
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))
    }

    /// Check both providers, logging any that are unreachable.
    /// Returns `true` when all are healthy.
    pub async fn check_providers(&self) -> bool {
        let embedder = self.state.embedding_provider();
        let llm = self.state.llm_provider();

        let embedder_ok = embedder.health_check().await.unwrap_or_else(|e| {
            tracing::warn!("Embedding health check failed: {}", e);
            false
        });
        let llm_ok = llm.health_check().await.unwrap_or_else(|e| {
            tracing::warn!("LLM health check failed: {}", e);
            false
        });

        if !embedder_ok {
            tracing::warn!("Embedding provider '{}' is not available", embedder.name());
        }
        if !llm_ok {
            tracing::warn!(
                "LLM provider '{}' ({}) is not available",
                llm.name(),
                llm.model()
            );
        }

        embedder_ok && llm_ok
    }

    /// Get the server address
    pub fn address(&self) -> String {
        self.config.address()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
