//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside YAML string values, resolved at load
//!   time (`$${VAR}` escapes to a literal `${VAR}`).
//! - Direct overrides from well-known variables such as `OPENAI_API_KEY`,
//!   which win over anything in the file.

use std::collections::HashMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::ReframeConfig;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const REFRAME_MODEL: &str = "REFRAME_MODEL";
pub const REFRAME_DB: &str = "REFRAME_DB";
pub const REFRAME_LOG_DIR: &str = "REFRAME_LOG_DIR";
pub const REFRAME_LOG_LEVEL: &str = "REFRAME_LOG_LEVEL";

/// Optional `$` escape followed by an uppercase `${NAME}` reference.
static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$)?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in a config value tree.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &process_env())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_REF.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply well-known environment variables on top of the file config.
///
/// Empty values are ignored so an exported-but-blank variable does not wipe
/// a value from the file.
pub fn apply_env_overrides(mut config: ReframeConfig, env: &HashMap<String, String>) -> ReframeConfig {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()).map(String::from);

    if let Some(v) = get(OPENAI_API_KEY) {
        config.credentials.openai_api_key = Some(v);
    }
    if let Some(v) = get(TAVILY_API_KEY) {
        config.credentials.tavily_api_key = Some(v);
    }
    if let Some(v) = get(TELEGRAM_TOKEN) {
        config.credentials.telegram_token = Some(v);
    }
    if let Some(v) = get(OPENAI_BASE_URL) {
        config.model.base_url = v;
    }
    if let Some(v) = get(REFRAME_MODEL) {
        config.model.name = v;
    }
    if let Some(v) = get(REFRAME_DB) {
        config.storage.db_path = v;
    }
    if let Some(v) = get(REFRAME_LOG_DIR) {
        config.logging.dir = v;
    }
    if let Some(v) = get(REFRAME_LOG_LEVEL) {
        config.logging.level = v;
    }
    config
}
