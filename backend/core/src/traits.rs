use anyhow::Result;
use async_trait::async_trait;

use crate::error::ReframeError;
use crate::types::SearchHit;

/// Trait for language-model completion services.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send a completion request and return the generated text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ReframeError>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Trait for web search services.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Ranked results for `query`; an empty vector means nothing was found.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ReframeError>;
}

/// Outbound side of a message-delivery channel.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}
