//! Health and service info endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::state::AppState;
use crate::types::{HealthResponse, ServiceStatus};

/// GET /health - Always 200; reports whether queries are accepted
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.status(),
    })
}

/// GET /info - Service description, models and index size
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    let index = match state.engine() {
        Ok(engine) => json!({
            "documents": engine.document_count(),
            "chunks": engine.chunk_count(),
        }),
        Err(_) => Value::Null,
    };

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented question answering over a local document directory",
        "status": state.status(),
        "ready": state.status() == ServiceStatus::Ready,
        "models": {
            "embedding": state.embedding_provider().name(),
            "embed_model": config.llm.embed_model,
            "generate_model": state.llm_provider().model(),
        },
        "retrieval": {
            "top_k": config.retrieval.top_k,
            "response_mode": config.retrieval.response_mode,
        },
        "index": index,
        "endpoints": {
            "POST /query": "Ask a question",
            "GET /health": "Readiness status",
            "GET /info": "This document",
        }
    }))
}
