//! Error types for the RAG service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG service errors
///
/// Startup errors (`Config`, `Load`, `EmbeddingInconsistency`, `IndexBuild`)
/// abort initialization. Per-request errors are translated to an HTTP
/// status at the route boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration, including the document directory
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document could not be read or parsed
    #[error("Failed to load '{path}': {message}")]
    Load { path: String, message: String },

    /// Embedding dimension differs from the one established for the index
    #[error("Embedding dimension mismatch for {context}: expected {expected}, got {actual}")]
    EmbeddingInconsistency {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Embedding call failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Index construction could not complete
    #[error("Index build failed: {message}")]
    IndexBuild {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Bad user input
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Query arrived before the index was ready
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Generation call failed or timed out
    #[error("Generation failed: {0}")]
    Generation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a load error for a file
    pub fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an index build error wrapping an underlying failure
    pub fn index_build(message: impl Into<String>, source: Error) -> Self {
        Self::IndexBuild {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Machine-readable error kind used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration_error",
            Error::Load { .. } => "load_error",
            Error::EmbeddingInconsistency { .. } => "embedding_inconsistency_error",
            Error::Embedding(_) => "embedding_error",
            Error::IndexBuild { .. } => "index_build_error",
            Error::InvalidQuery(_) => "invalid_query_error",
            Error::ServiceUnavailable(_) => "service_unavailable_error",
            Error::Generation(_) => "generation_error",
            Error::Io(_) | Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error at the request boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
