use std::sync::Mutex;

use async_trait::async_trait;
use reframe_core::{ReframeError, SearchHit, SearchProvider};

/// In-memory search provider returning a fixed hit list and recording
/// every query it receives.
#[derive(Default)]
pub struct MockSearchProvider {
    hits: Vec<SearchHit>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(
        mut self,
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.hits.push(SearchHit {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        });
        self
    }

    /// Every search fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    fn name(&self) -> &str {
        "mock-search"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ReframeError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());
        if self.fail {
            return Err(ReframeError::transport("mock-search", "scripted failure"));
        }
        Ok(self.hits.clone())
    }
}
