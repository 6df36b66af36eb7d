//! Reframe runtime configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Every section is optional in
//! the file; missing fields take the values in [`crate::defaults`].

use serde::{Deserialize, Serialize};

use crate::defaults;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReframeConfig {
    /// Service credentials. Usually supplied through the environment.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Language model endpoint and sampling.
    #[serde(default)]
    pub model: ModelConfig,

    /// Web search endpoint and trigger keywords.
    #[serde(default)]
    pub search: SearchConfig,

    /// Observe/correct loop tuning.
    #[serde(default)]
    pub feedback: FeedbackConfig,

    #[serde(default)]
    pub persona: PersonaConfig,

    /// Retry policy for transport failures.
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tavily_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_token: Option<String>,
}

/// All three credentials, known to be present.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub tavily_api_key: String,
    pub telegram_token: String,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default = "defaults::model_base_url")]
    pub base_url: String,
    #[serde(default = "defaults::model_name")]
    pub name: String,
    #[serde(default = "defaults::model_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "defaults::model_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "defaults::persona_temperature")]
    pub persona_temperature: f32,
    #[serde(default = "defaults::observer_temperature")]
    pub observer_temperature: f32,
    #[serde(default = "defaults::corrector_temperature")]
    pub corrector_temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::model_base_url(),
            name: defaults::model_name(),
            max_tokens: defaults::model_max_tokens(),
            timeout_secs: defaults::model_timeout_secs(),
            persona_temperature: defaults::persona_temperature(),
            observer_temperature: defaults::observer_temperature(),
            corrector_temperature: defaults::corrector_temperature(),
        }
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    #[serde(default = "defaults::search_base_url")]
    pub base_url: String,
    /// Tavily search depth: `basic` or `advanced`.
    #[serde(default = "defaults::search_depth")]
    pub depth: String,
    #[serde(default = "defaults::search_max_results")]
    pub max_results: usize,
    #[serde(default = "defaults::search_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the built-in search trigger keywords.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::search_base_url(),
            depth: defaults::search_depth(),
            max_results: defaults::search_max_results(),
            timeout_secs: defaults::search_timeout_secs(),
            keywords: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackConfig {
    #[serde(default = "defaults::persona_window")]
    pub persona_window: usize,
    #[serde(default = "defaults::observer_window")]
    pub observer_window: usize,
    #[serde(default = "defaults::max_reasoning_iterations")]
    pub max_reasoning_iterations: usize,
    #[serde(default = "defaults::min_instruction_chars")]
    pub min_instruction_chars: usize,
    /// Overrides the built-in problem trigger words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_keywords: Option<Vec<String>>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            persona_window: defaults::persona_window(),
            observer_window: defaults::observer_window(),
            max_reasoning_iterations: defaults::max_reasoning_iterations(),
            min_instruction_chars: defaults::min_instruction_chars(),
            problem_keywords: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaConfig {
    /// Replaces the built-in startup instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_instructions: Option<String>,
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(default = "defaults::retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "defaults::retry_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "defaults::retry_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "defaults::retry_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "defaults::enabled")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::retry_max_attempts(),
            base_delay_ms: defaults::retry_base_delay_ms(),
            backoff_factor: defaults::retry_backoff_factor(),
            max_delay_ms: defaults::retry_max_delay_ms(),
            jitter: defaults::enabled(),
        }
    }
}

// ---------------------------------------------------------------------------
// Storage & logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default = "defaults::db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
    #[serde(default = "defaults::log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            dir: defaults::log_dir(),
        }
    }
}
