//! `reframe-config`: runtime configuration for the Reframe bot.
//!
//! Provides:
//! - Typed config schema (model, search, feedback loop, retry, storage, logging)
//! - YAML loading with `.env` support
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value normalization
//! - Validation and the startup credential gate
//! - Redaction for safe printing

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{load_config, load_dotenv, resolve_config_path};
pub use redact::{redact, redacted_config};
pub use schema::{
    Credentials, CredentialsConfig, FeedbackConfig, LoggingConfig, ModelConfig, PersonaConfig,
    ReframeConfig, RetryConfig, SearchConfig, StorageConfig,
};
pub use validation::{
    missing_credentials, require_credentials, validate, ConfigValidationError, ValidationReport,
};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Load, substitute env vars, apply overrides and defaults, and validate.
///
/// This is the main entry point for loading a config at runtime. A `None`
/// path means "no file": built-in defaults plus the environment.
pub async fn load_and_prepare(path: Option<&Path>) -> Result<(ReframeConfig, ValidationReport)> {
    let env = env::process_env();
    let raw = match path {
        Some(path) => load_config(path).await?,
        None => Value::Object(Default::default()),
    };
    prepare(raw, &env)
}

/// The pure part of [`load_and_prepare`], driven by an explicit env map.
pub fn prepare(
    raw: Value,
    env: &HashMap<String, String>,
) -> Result<(ReframeConfig, ValidationReport)> {
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: ReframeConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;

    let config = apply_env_overrides(config, env);
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok((config, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn prepare_merges_file_env_and_defaults() {
        let raw = json!({
            "credentials": { "tavilyApiKey": "${MY_TAVILY}" },
            "model": { "baseUrl": "https://proxy.example/v1/" },
            "feedback": { "problemKeywords": ["ошибка", "проблема", "недочёт"] }
        });
        let env = env(&[
            ("MY_TAVILY", "tvly-1"),
            ("OPENAI_API_KEY", "sk-1"),
            ("TELEGRAM_TOKEN", "1:x"),
        ]);

        let (cfg, report) = prepare(raw, &env).unwrap();
        assert!(report.is_valid());
        assert_eq!(cfg.model.base_url, "https://proxy.example/v1");
        assert_eq!(cfg.feedback.problem_keywords.as_ref().unwrap().len(), 3);

        let creds = require_credentials(&cfg).unwrap();
        assert_eq!(creds.tavily_api_key, "tvly-1");
        assert_eq!(creds.openai_api_key, "sk-1");
    }

    #[test]
    fn unresolvable_reference_fails_loading() {
        let raw = json!({ "credentials": { "openaiApiKey": "${NOPE}" } });
        assert!(prepare(raw, &HashMap::new()).is_err());
    }

    #[test]
    fn type_mismatch_fails_loading() {
        let raw = json!({ "feedback": { "observerWindow": "six" } });
        assert!(prepare(raw, &HashMap::new()).is_err());
    }
}
