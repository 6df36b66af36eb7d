use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reframe_core::{with_timeout, ReframeError, SearchHit, SearchProvider};
use reframe_planner::{retry_async, RetryPolicy};

/// Wraps a search provider with a per-attempt deadline and bounded retry.
pub struct ResilientSearchProvider {
    inner: Arc<dyn SearchProvider>,
    timeout: Duration,
    policy: RetryPolicy,
}

impl ResilientSearchProvider {
    pub fn new(inner: Arc<dyn SearchProvider>, timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            policy,
        }
    }
}

#[async_trait]
impl SearchProvider for ResilientSearchProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ReframeError> {
        let name = self.inner.name();
        retry_async(&self.policy, name, || {
            with_timeout(name, self.timeout, self.inner.search(query))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl SearchProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ReframeError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_search_times_out_as_transport() {
        let provider = ResilientSearchProvider::new(
            Arc::new(Slow),
            Duration::from_secs(1),
            RetryPolicy::none(),
        );
        let err = provider.search("q").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test(start_paused = true)]
    async fn failing_search_is_retried() {
        let mock = Arc::new(crate::MockSearchProvider::failing());
        let provider =
            ResilientSearchProvider::new(mock.clone(), Duration::from_secs(1), RetryPolicy::default());
        assert!(provider.search("q").await.is_err());
        assert_eq!(mock.call_count(), 2);
    }
}
