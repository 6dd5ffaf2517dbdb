//! Core types for the RAG service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType};
pub use query::QueryRequest;
pub use response::{preview, Answer, HealthResponse, QueryResponse, RetrievedChunk, ServiceStatus};
