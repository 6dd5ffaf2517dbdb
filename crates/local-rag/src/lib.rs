//! local-rag: minimal retrieval-augmented question answering over a local folder
//!
//! Documents in one directory are chunked and embedded once at startup into
//! an in-memory index. Questions are answered by retrieving the most similar
//! chunks and passing them to a local LLM served by Ollama.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod query_engine;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use query_engine::{QueryEngine, QuerySettings};
pub use server::RagServer;
pub use types::{
    document::{Chunk, Document, FileType},
    query::QueryRequest,
    response::{Answer, QueryResponse},
};
