//! Query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Answer a question from the indexed documents
pub async fn query_rag(
    State(state): State<AppState>,
    request: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = request.map_err(|e| Error::InvalidQuery(e.body_text()))?;

    if request.question.trim().is_empty() {
        return Err(Error::InvalidQuery("question must not be blank".to_string()));
    }

    // Not ready: fail before any embedding or generation work
    let engine = state.engine()?;

    tracing::info!("Query: \"{}\"", request.question);

    let answer = engine.query(&request.question).await?;
    Ok(Json(QueryResponse::from(answer)))
}
