//! Document ingestion: directory loading, text extraction and chunking

mod chunker;
mod loader;
mod parser;

pub use chunker::TextChunker;
pub use loader::{DirectoryStatus, DocumentLoader};
pub use parser::FileParser;
