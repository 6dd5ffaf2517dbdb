//! Response types: answers, source previews and health status

use serde::{Deserialize, Serialize};

/// Marker appended to a preview that was cut short
pub const TRUNCATION_MARKER: &str = "...";

/// Body of a successful `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// The question as submitted
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Previews of the supporting chunks, most similar first
    pub source_docs: Vec<String>,
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self {
            question: answer.question,
            answer: answer.text,
            source_docs: answer.sources.into_iter().map(|s| s.preview).collect(),
        }
    }
}

/// A retrieved chunk as reported to the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// Chunk identifier
    pub chunk_id: String,
    /// Source document reference
    pub document_id: String,
    /// Cosine similarity to the question
    pub similarity: f32,
    /// Chunk text cut to the preview length
    pub preview: String,
}

/// Generated text plus the retrieval result used to produce it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The question as submitted
    pub question: String,
    /// Generated text (never blank)
    pub text: String,
    /// Retrieved chunks in descending similarity
    pub sources: Vec<RetrievedChunk>,
}

/// Observable state of the query engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Index not built yet
    Initializing,
    /// Accepting queries
    Ready,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: ServiceStatus,
}

/// Cut `text` to at most `max_chars` characters, appending the marker when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_end, _)) => format!("{}{}", &text[..byte_end], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
