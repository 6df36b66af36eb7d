//! Web search through the Tavily API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reframe_core::{ReframeError, SearchHit, SearchProvider};

const PROVIDER: &str = "tavily";

/// Tavily search client.
pub struct TavilySearchProvider {
    client: Client,
    api_key: String,
    base_url: String,
    depth: String,
    max_results: usize,
}

impl TavilySearchProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.tavily.com".to_string(),
            depth: "advanced".to_string(),
            max_results: 5,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// `basic` or `advanced`.
    pub fn with_depth(mut self, depth: impl Into<String>) -> Self {
        self.depth = depth.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder().timeout(timeout).build().unwrap_or_default();
        self
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl SearchProvider for TavilySearchProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ReframeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        debug!(query, depth = %self.depth, "Searching Tavily");

        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: &self.depth,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReframeError::transport(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ReframeError::from_status(PROVIDER, status.as_u16(), &error_body));
        }

        let parsed: TavilyResponse = response.json().await.map_err(|e| {
            ReframeError::transport(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        let hits: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .take(self.max_results)
            .map(|r| SearchHit {
                title: r.title,
                snippet: r.content,
                url: r.url,
            })
            .collect();

        debug!(query, hits = hits.len(), "Tavily search complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn sends_advanced_search_and_maps_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_body(Matcher::Json(serde_json::json!({
                "api_key": "tvly-test",
                "query": "КПТ исследования",
                "search_depth": "advanced",
                "max_results": 5
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[
                    {"title":"CBT review","url":"https://example.org/cbt","content":"Meta-analysis"},
                    {"title":"No link","url":"","content":"dropped"}
                ]}"#,
            )
            .create_async()
            .await;

        let provider = TavilySearchProvider::new("tvly-test").with_base_url(server.url());
        let hits = provider.search("  КПТ исследования ").await.unwrap();

        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://example.org/cbt");
        assert_eq!(hits[0].snippet, "Meta-analysis");
    }

    #[tokio::test]
    async fn missing_results_field_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let provider = TavilySearchProvider::new("tvly-test").with_base_url(server.url());
        assert!(provider.search("anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_is_quota_or_auth() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let provider = TavilySearchProvider::new("tvly-test").with_base_url(server.url());
        let err = provider.search("query").await.unwrap_err();
        assert_eq!(err.kind(), "quota_or_auth");
    }

    #[tokio::test]
    async fn blank_query_skips_the_request() {
        let provider = TavilySearchProvider::new("tvly-test").with_base_url("http://127.0.0.1:9");
        assert!(provider.search("   ").await.unwrap().is_empty());
    }
}
