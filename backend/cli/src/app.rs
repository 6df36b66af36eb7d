//! Wires providers, storage and the feedback loop from a prepared config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use reframe_agent::{FeedbackLoop, LoopSettings, TherapyService};
use reframe_config::{Credentials, ReframeConfig, RetryConfig};
use reframe_core::{LlmProvider, SearchProvider};
use reframe_memory::{DialogLog, SqliteDialogLog};
use reframe_planner::{OpenAiProvider, ResilientProvider, RetryPolicy};
use reframe_tools::{ResilientSearchProvider, TavilySearchProvider};

pub fn retry_policy(retry: &RetryConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: retry.max_attempts,
        base_delay_ms: retry.base_delay_ms,
        backoff_factor: retry.backoff_factor,
        max_delay_ms: retry.max_delay_ms,
        jitter: retry.jitter,
    }
}

pub fn llm_provider(config: &ReframeConfig, api_key: &str) -> Arc<dyn LlmProvider> {
    let timeout = Duration::from_secs(config.model.timeout_secs);
    let openai = OpenAiProvider::new(api_key).with_base_url(&config.model.base_url);
    Arc::new(ResilientProvider::new(
        Arc::new(openai),
        timeout,
        retry_policy(&config.retry),
    ))
}

pub fn search_provider(config: &ReframeConfig, api_key: &str) -> Arc<dyn SearchProvider> {
    let search = &config.search;
    let timeout = Duration::from_secs(search.timeout_secs);
    let tavily = TavilySearchProvider::new(api_key)
        .with_base_url(&search.base_url)
        .with_depth(&search.depth)
        .with_max_results(search.max_results)
        .with_timeout(timeout);
    Arc::new(ResilientSearchProvider::new(
        Arc::new(tavily),
        timeout,
        retry_policy(&config.retry),
    ))
}

pub fn dialog_log(config: &ReframeConfig) -> Result<Arc<dyn DialogLog>> {
    let path = &config.storage.db_path;
    let log = SqliteDialogLog::open(path)
        .with_context(|| format!("Failed to open dialog database at {path}"))?;
    Ok(Arc::new(log))
}

pub fn build_service(config: &ReframeConfig, credentials: &Credentials) -> Result<TherapyService> {
    let llm = llm_provider(config, &credentials.openai_api_key);
    let search = search_provider(config, &credentials.tavily_api_key);
    let dialog_log = dialog_log(config)?;

    let settings = LoopSettings::from_config(config);
    let feedback_loop = FeedbackLoop::with_provider(llm, search.clone(), &settings);

    info!(
        model = %config.model.name,
        db = %config.storage.db_path,
        persona_window = settings.persona_window,
        observer_window = settings.observer_window,
        "Feedback loop ready"
    );
    Ok(TherapyService::new(feedback_loop, search, dialog_log))
}
