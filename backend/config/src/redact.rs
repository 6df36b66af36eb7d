//! Config redaction: produce safe-to-print config snapshots by masking
//! credential fields.

use serde_json::Value;

use crate::schema::ReframeConfig;

/// Keys whose string values are secrets.
static SECRET_KEYS: &[&str] = &[
    "openaiApiKey",
    "tavilyApiKey",
    "telegramToken",
    "apiKey",
    "api_key",
    "token",
    "secret",
    "password",
];

/// Redact a config JSON value, masking every secret field.
///
/// Keeps a short prefix as a hint so operators can tell keys apart.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Serialize and redact a typed config in one step.
pub fn redacted_config(config: &ReframeConfig) -> Value {
    let value = serde_json::to_value(config).unwrap_or(Value::Null);
    redact(&value)
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn mask(s: &str) -> String {
    let hint: String = s.chars().take(4).collect();
    if s.chars().count() > 8 {
        format!("{hint}***")
    } else {
        "***".to_string()
    }
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_secret_key(key) && !s.is_empty() => Value::String(mask(s)),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
