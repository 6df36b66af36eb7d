use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reframe_core::{LlmProvider, LlmRequest, LlmResponse, ReframeError};

/// One scripted answer from [`MockProvider`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fails with a retryable transport error.
    Transport,
    /// Fails with a credential/rate-limit error.
    QuotaOrAuth,
}

impl MockReply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// A mock LLM provider that returns canned responses.
///
/// Scripted replies are consumed in order; once the script runs out the
/// fixed response (or `"Mock response"`) is returned. Every request is
/// recorded for later inspection.
pub struct MockProvider {
    name: String,
    fixed_response: Option<MockReply>,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(MockReply::Text(response.into()));
        self
    }

    /// Answer every unscripted call with `reply`.
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fixed_response = Some(reply);
        self
    }

    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(replies);
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse, ReframeError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(req.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let reply = next
            .or_else(|| self.fixed_response.clone())
            .unwrap_or_else(|| MockReply::text("Mock response"));

        match reply {
            MockReply::Text(content) => Ok(LlmResponse {
                content,
                provider: self.name.clone(),
                model: req.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            }),
            MockReply::Transport => Err(ReframeError::transport(&self.name, "scripted failure")),
            MockReply::QuotaOrAuth => {
                Err(ReframeError::quota_or_auth(&self.name, "scripted quota exhaustion"))
            }
        }
    }
}
