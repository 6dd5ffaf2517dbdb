//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::Result;

/// Sampling parameters passed with every generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum number of generated tokens
    pub max_tokens: u32,
}

impl From<&LlmConfig> for GenerationParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

/// Trait for prompt completion
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt`; failures and timeouts are `Error::Generation`
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
