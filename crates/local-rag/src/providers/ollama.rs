//! Ollama HTTP client and the provider adapters built on it

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationParams, LlmProvider};

/// Ollama API client with optional retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Server base URL without trailing slash
    base_url: String,
    /// Request timeout (reported in errors)
    timeout: Duration,
    /// Retries after the first failed attempt
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries: config.max_retries,
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.saturating_pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let url = url.as_str();

        self.retry_request(|| async move {
            let request = EmbedRequest {
                model,
                prompt: text,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::embedding(self.describe("Embedding request", &e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {} - {}",
                    status, body
                )));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse embedding response: {}", e))
            })?;

            if embed_response.embedding.is_empty() {
                return Err(Error::embedding(format!(
                    "Model '{}' returned an empty embedding",
                    model
                )));
            }

            Ok(embed_response.embedding)
        })
        .await
    }

    /// Complete a prompt
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let url = url.as_str();

        self.retry_request(|| async move {
            let request = GenerateRequest {
                model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: params.temperature,
                    num_predict: params.max_tokens,
                },
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::generation(self.describe("Generation request", &e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::generation(format!(
                    "Generation failed: HTTP {} - {}",
                    status, body
                )));
            }

            let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                Error::generation(format!("Failed to parse generation response: {}", e))
            })?;

            Ok(generate_response.response)
        })
        .await
    }

    fn describe(&self, what: &str, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("{} timed out after {:?}", what, self.timeout)
        } else {
            format!("{} failed: {}", what, err)
        }
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    dimensions: Option<usize>,
}

impl OllamaEmbedder {
    /// Create from a shared client
    pub fn new(client: Arc<OllamaClient>, model: String, dimensions: Option<usize>) -> Self {
        Self {
            client,
            model,
            dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    /// Create from a shared client
    pub fn new(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        tracing::debug!("Generating with {} ({} prompt chars)", self.model, prompt.len());
        self.client.generate(&self.model, prompt, params).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
