//! Query request types

use serde::{Deserialize, Serialize};

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,
}

