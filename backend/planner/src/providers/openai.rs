use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reframe_core::{LlmProvider, LlmRequest, LlmResponse, ReframeError};

const PROVIDER: &str = "openai";

/// OpenAI-compatible chat completions provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// HTTP-level timeout; the caller's own deadline still applies on top.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder().timeout(timeout).build().unwrap_or_default();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ReframeError> {
        let start = Instant::now();

        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(request.system_prompt.clone()),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: Some(request.user_prompt.clone()),
        });

        let body = ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
        };

        debug!(model = %request.model, "Sending request to OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ReframeError::from_status(PROVIDER, status.as_u16(), &error_body));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            ReframeError::transport(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        let Some(choice) = chat_response.choices.into_iter().next() else {
            return Err(ReframeError::degenerate(PROVIDER, "response had no choices"));
        };
        let content = choice.message.content.unwrap_or_default();

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(LlmResponse {
            content,
            provider: PROVIDER.to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn classify_reqwest(err: reqwest::Error) -> ReframeError {
    if err.is_timeout() {
        ReframeError::transport(PROVIDER, format!("request timed out: {err}"))
    } else {
        ReframeError::transport(PROVIDER, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request() -> LlmRequest {
        LlmRequest {
            model: "gpt-4".into(),
            system_prompt: "Вы - психолог".into(),
            user_prompt: "Здравствуйте".into(),
            max_tokens: 256,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn parses_first_choice_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "Вы - психолог"},
                    {"role": "user", "content": "Здравствуйте"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Добрый день!"}}],
                    "usage":{"total_tokens":42}}"#,
            )
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test").with_base_url(server.url());
        let response = provider.complete(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Добрый день!");
        assert_eq!(response.tokens_used, 42);
        assert_eq!(response.provider, "openai");
    }

    #[tokio::test]
    async fn unauthorized_is_quota_or_auth() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key"}}"#)
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-bad").with_base_url(server.url());
        let err = provider.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "quota_or_auth");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn server_error_is_retryable_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test").with_base_url(server.url());
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn empty_choices_is_degenerate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test").with_base_url(server.url());
        let err = provider.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "degenerate_output");
    }

    #[tokio::test]
    async fn garbage_body_is_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test").with_base_url(server.url());
        let err = provider.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
