//! Config defaults: constants, serde default providers, and normalization.

use crate::schema::ReframeConfig;

pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "gpt-4";
pub const DEFAULT_MODEL_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

/// Sampling temperatures per role.
pub const DEFAULT_PERSONA_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_OBSERVER_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_CORRECTOR_TEMPERATURE: f32 = 0.4;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_SEARCH_DEPTH: &str = "advanced";
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 5;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

/// Turns of history handed to the persona.
pub const DEFAULT_PERSONA_WINDOW: usize = 5;
/// Turns of history handed to the observer.
pub const DEFAULT_OBSERVER_WINDOW: usize = 6;
pub const DEFAULT_MAX_REASONING_ITERATIONS: usize = 3;
/// Corrector output shorter than this is rejected.
pub const DEFAULT_MIN_INSTRUCTION_CHARS: usize = 20;

pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_BACKOFF_FACTOR: f64 = 2.0;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5_000;

pub const DEFAULT_DB_PATH: &str = "dialogs.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub(crate) fn model_base_url() -> String {
    DEFAULT_MODEL_BASE_URL.to_string()
}
pub(crate) fn model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}
pub(crate) fn model_max_tokens() -> u32 {
    DEFAULT_MODEL_MAX_TOKENS
}
pub(crate) fn model_timeout_secs() -> u64 {
    DEFAULT_MODEL_TIMEOUT_SECS
}
pub(crate) fn persona_temperature() -> f32 {
    DEFAULT_PERSONA_TEMPERATURE
}
pub(crate) fn observer_temperature() -> f32 {
    DEFAULT_OBSERVER_TEMPERATURE
}
pub(crate) fn corrector_temperature() -> f32 {
    DEFAULT_CORRECTOR_TEMPERATURE
}
pub(crate) fn search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.to_string()
}
pub(crate) fn search_depth() -> String {
    DEFAULT_SEARCH_DEPTH.to_string()
}
pub(crate) fn search_max_results() -> usize {
    DEFAULT_SEARCH_MAX_RESULTS
}
pub(crate) fn search_timeout_secs() -> u64 {
    DEFAULT_SEARCH_TIMEOUT_SECS
}
pub(crate) fn persona_window() -> usize {
    DEFAULT_PERSONA_WINDOW
}
pub(crate) fn observer_window() -> usize {
    DEFAULT_OBSERVER_WINDOW
}
pub(crate) fn max_reasoning_iterations() -> usize {
    DEFAULT_MAX_REASONING_ITERATIONS
}
pub(crate) fn min_instruction_chars() -> usize {
    DEFAULT_MIN_INSTRUCTION_CHARS
}
pub(crate) fn retry_max_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}
pub(crate) fn retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}
pub(crate) fn retry_backoff_factor() -> f64 {
    DEFAULT_RETRY_BACKOFF_FACTOR
}
pub(crate) fn retry_max_delay_ms() -> u64 {
    DEFAULT_RETRY_MAX_DELAY_MS
}
pub(crate) fn enabled() -> bool {
    true
}
pub(crate) fn db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}
pub(crate) fn log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
pub(crate) fn log_dir() -> String {
    DEFAULT_LOG_DIR.to_string()
}

/// Normalize a freshly loaded config.
pub fn apply_all_defaults(config: ReframeConfig) -> ReframeConfig {
    let config = apply_url_defaults(config);
    let config = apply_keyword_defaults(config);
    apply_credential_defaults(config)
}

/// Blank URLs fall back to the defaults; trailing slashes are dropped.
fn apply_url_defaults(mut config: ReframeConfig) -> ReframeConfig {
    if config.model.base_url.trim().is_empty() {
        config.model.base_url = model_base_url();
    }
    if config.search.base_url.trim().is_empty() {
        config.search.base_url = search_base_url();
    }
    config.model.base_url = config.model.base_url.trim_end_matches('/').to_string();
    config.search.base_url = config.search.base_url.trim_end_matches('/').to_string();
    config
}

/// Keyword overrides are trimmed; an empty list means "use the built-ins".
fn apply_keyword_defaults(mut config: ReframeConfig) -> ReframeConfig {
    fn clean(list: Option<Vec<String>>) -> Option<Vec<String>> {
        let list: Vec<String> = list?
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        (!list.is_empty()).then_some(list)
    }
    config.search.keywords = clean(config.search.keywords.take());
    config.feedback.problem_keywords = clean(config.feedback.problem_keywords.take());
    config
}

/// Empty credential strings count as absent.
fn apply_credential_defaults(mut config: ReframeConfig) -> ReframeConfig {
    let creds = &mut config.credentials;
    for slot in [
        &mut creds.openai_api_key,
        &mut creds.tavily_api_key,
        &mut creds.telegram_token,
    ] {
        if slot.as_deref().map(str::trim).is_some_and(str::is_empty) {
            *slot = None;
        }
    }
    config
}
