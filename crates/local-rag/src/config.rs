//! Configuration for the RAG service
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `RAG_*` environment variables. The binary applies command-line flags last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Main RAG service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Document directory configuration
    pub documents: DocumentsConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Retrieval and response configuration
    pub retrieval: RetrievalConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Bind the listener before the index is built.
    /// Health reports `initializing` and queries get 503 until ready.
    pub serve_during_init: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            serve_during_init: false,
        }
    }
}

/// Document directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding the corpus
    pub dir: PathBuf,
    /// Create the directory during provisioning when it is missing
    pub auto_create: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Restrict loading to these extensions (empty = every supported type)
    pub extensions: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./sample_docs"),
            auto_create: true,
            recursive: true,
            extensions: Vec::new(),
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama `/api/embeddings` with `llm.embed_model`
    #[default]
    Ollama,
    /// Deterministic in-process feature hashing (no model server)
    Hashing,
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" => Ok(Self::Hashing),
            other => Err(Error::Config(format!(
                "Unknown embedding backend '{}' (expected 'ollama' or 'hashing')",
                other
            ))),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend producing the vectors
    pub backend: EmbeddingBackend,
    /// Expected dimensions. When unset the first vector returned fixes it
    /// (the hashing backend uses 384).
    pub dimensions: Option<usize>,
    /// Number of chunks per embedding batch
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            dimensions: None,
            batch_size: 16,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum generated tokens
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a failed request (0 = fail on first error, at most
    /// [`LlmConfig::MAX_RETRIES`])
    pub max_retries: u32,
    /// Generator input limit in characters
    pub max_prompt_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "bge-small-zh-v1.5".to_string(),
            generate_model: "qwen:1.8b-chat".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            timeout_secs: 120,
            max_retries: 0,
            max_prompt_chars: 8000,
        }
    }
}

impl LlmConfig {
    /// Upper bound for `max_retries`; backoff doubles per attempt
    pub const MAX_RETRIES: u32 = 10;
}

/// How retrieved chunks are turned into generator calls
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Stuff as many chunks as fit into a single prompt
    #[default]
    Compact,
    /// One call per chunk, refining the running answer
    Refine,
}

impl FromStr for ResponseMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "refine" => Ok(Self::Refine),
            other => Err(Error::Config(format!(
                "Unknown response mode '{}' (expected 'compact' or 'refine')",
                other
            ))),
        }
    }
}

/// Retrieval and response shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    /// Characters of each source chunk returned to the caller
    pub preview_chars: usize,
    /// Response compaction mode
    pub response_mode: ResponseMode,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            preview_chars: 200,
            response_mode: ResponseMode::Compact,
        }
    }
}

impl RagConfig {
    /// Load configuration from an optional TOML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text; omitted keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply `RAG_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("RAG_DOC_DIR") {
            self.documents.dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("RAG_AUTO_CREATE_DIR") {
            self.documents.auto_create = parse_var("RAG_AUTO_CREATE_DIR", &v)?;
        }
        if let Some(v) = lookup("RAG_EMBED_BACKEND") {
            self.embeddings.backend = v.parse()?;
        }
        if let Some(v) = lookup("RAG_EMBED_MODEL") {
            self.llm.embed_model = v;
        }
        if let Some(v) = lookup("RAG_EMBED_DIMENSIONS") {
            self.embeddings.dimensions = Some(parse_var("RAG_EMBED_DIMENSIONS", &v)?);
        }
        if let Some(v) = lookup("RAG_LLM_MODEL") {
            self.llm.generate_model = v;
        }
        if let Some(v) = lookup("RAG_OLLAMA_URL") {
            self.llm.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("RAG_TOP_K") {
            self.retrieval.top_k = parse_var("RAG_TOP_K", &v)?;
        }
        if let Some(v) = lookup("RAG_TEMPERATURE") {
            self.llm.temperature = parse_var("RAG_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("RAG_MAX_TOKENS") {
            self.llm.max_tokens = parse_var("RAG_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("RAG_RESPONSE_MODE") {
            self.retrieval.response_mode = v.parse()?;
        }
        if let Some(v) = lookup("RAG_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("RAG_PORT") {
            self.server.port = parse_var("RAG_PORT", &v)?;
        }
        if let Some(v) = lookup("RAG_SERVE_DURING_INIT") {
            self.server.serve_during_init = parse_var("RAG_SERVE_DURING_INIT", &v)?;
        }
        Ok(())
    }

    /// Check value ranges; every violation is a configuration error
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".into()));
        }
        if self.retrieval.preview_chars == 0 {
            return Err(Error::Config("retrieval.preview_chars must be at least 1".into()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be at least 1".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::Config("llm.max_tokens must be at least 1".into()));
        }
        if self.llm.max_retries > LlmConfig::MAX_RETRIES {
            return Err(Error::Config(format!(
                "llm.max_retries must be at most {}, got {}",
                LlmConfig::MAX_RETRIES,
                self.llm.max_retries
            )));
        }
        if self.llm.max_prompt_chars == 0 {
            return Err(Error::Config("llm.max_prompt_chars must be at least 1".into()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be at least 1".into()));
        }
        if self.embeddings.dimensions == Some(0) {
            return Err(Error::Config("embeddings.dimensions must be at least 1".into()));
        }
        Ok(())
    }

    /// Listen address as `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}
