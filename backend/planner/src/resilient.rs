use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reframe_core::{with_timeout, LlmProvider, LlmRequest, LlmResponse, ReframeError};
use tracing::debug;

use crate::retry::{retry_async, RetryPolicy};

/// Wraps a provider with a per-attempt deadline and bounded retry.
pub struct ResilientProvider {
    inner: Arc<dyn LlmProvider>,
    timeout: Duration,
    policy: RetryPolicy,
}

impl ResilientProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            policy,
        }
    }
}

#[async_trait]
impl LlmProvider for ResilientProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ReframeError> {
        let name = self.inner.name();
        let response = retry_async(&self.policy, name, || {
            with_timeout(name, self.timeout, self.inner.complete(request))
        })
        .await?;
        debug!(
            provider = name,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Completion received"
        );
        Ok(response)
    }
}
