//! HTTP routes for the RAG server

pub mod health;
pub mod query;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query_rag))
        .route("/health", get(health::health_check))
        .route("/info", get(health::info))
}
