//! Vector index and its construction

mod builder;
mod index;

pub use builder::IndexBuilder;
pub use index::{ScoredChunk, VectorIndex};
