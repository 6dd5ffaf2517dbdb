//! Fake providers shared by unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use super::embedding::EmbeddingProvider;
use super::hashing::HashingEmbedder;
use super::llm::{GenerationParams, LlmProvider};
use crate::error::{Error, Result};

type EmbedFn = dyn Fn(&str) -> Result<Vec<f32>> + Send + Sync;

/// Embedder driven by a closure, counting its calls
pub struct FnEmbedder {
    embed_fn: Box<EmbedFn>,
    calls: AtomicUsize,
}

impl FnEmbedder {
    pub fn new<F>(embed_fn: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<f32>> + Send + Sync + 'static,
    {
        Self {
            embed_fn: Box::new(embed_fn),
            calls: AtomicUsize::new(0),
        }
    }

    /// Hashing embedder behaviour with call counting
    pub fn hashing() -> Self {
        let inner = HashingEmbedder::new(64);
        Self::new(move |text| Ok(inner.embed_text(text)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FnEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.embed_fn)(text)
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Hashing embedder that blocks every call until its gate opens
pub struct GatedEmbedder {
    inner: HashingEmbedder,
    gate: watch::Receiver<bool>,
}

impl GatedEmbedder {
    /// Returns the embedder and the sender that opens the gate with `true`
    pub fn new() -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let embedder = Self {
            inner: HashingEmbedder::new(64),
            gate: rx,
        };
        (embedder, tx)
    }
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut gate = self.gate.clone();
        gate.wait_for(|open| *open)
            .await
            .map_err(|_| Error::embedding("gate sender dropped"))?;
        Ok(self.inner.embed_text(text))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(64)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "gated"
    }
}

enum Reply {
    Fixed(String),
    Fail(String),
    EchoContext,
}

/// Generator returning a scripted reply and recording every prompt
pub struct ScriptedLlm {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<GenerationParams>>,
}

impl ScriptedLlm {
    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::with(Reply::Fixed(text.to_string()))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with(Reply::Fail(message.to_string()))
    }

    /// Replies with the context section of the prompt
    pub fn echo_context() -> Arc<Self> {
        Self::with(Reply::EchoContext)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn params(&self) -> Vec<GenerationParams> {
        self.params.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.params.lock().push(*params);

        match &self.reply {
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(Error::generation(message.clone())),
            Reply::EchoContext => {
                let context = prompt
                    .split_once("Context:")
                    .map(|(_, rest)| rest)
                    .and_then(|rest| rest.split_once("Question:").map(|(ctx, _)| ctx))
                    .unwrap_or(prompt);
                Ok(context.trim().to_string())
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
