//! Config validation: range checks with user-friendly messages, plus the
//! startup credential gate.

use reframe_core::ReframeError;
use thiserror::Error;

use crate::env::{OPENAI_API_KEY, TAVILY_API_KEY, TELEGRAM_TOKEN};
use crate::schema::{Credentials, ReframeConfig};

/// Tavily rejects larger pages.
const MAX_SEARCH_RESULTS: usize = 20;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the tunables and return a report of all errors and warnings.
///
/// Credentials are not checked here; see [`require_credentials`].
pub fn validate(config: &ReframeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_model(config, &mut report);
    validate_search(config, &mut report);
    validate_feedback(config, &mut report);
    validate_persona(config, &mut report);
    validate_retry(config, &mut report);
    report
}

fn validate_model(config: &ReframeConfig, report: &mut ValidationReport) {
    let model = &config.model;
    if model.name.trim().is_empty() {
        report.error("model.name", "Model name cannot be empty");
    }
    if !model.base_url.starts_with("http://") && !model.base_url.starts_with("https://") {
        report.error("model.baseUrl", format!("'{}' is not an http(s) URL", model.base_url));
    } else if model.base_url.starts_with("http://") {
        report.warn("model.baseUrl", "API key will be sent over plain http");
    }
    if model.max_tokens == 0 {
        report.error("model.maxTokens", "maxTokens must be > 0");
    }
    if model.timeout_secs == 0 {
        report.error("model.timeoutSecs", "timeoutSecs must be > 0");
    }
    for (field, t) in [
        ("model.personaTemperature", model.persona_temperature),
        ("model.observerTemperature", model.observer_temperature),
        ("model.correctorTemperature", model.corrector_temperature),
    ] {
        if !(0.0..=2.0).contains(&t) {
            report.error(field, format!("temperature {t} is outside 0.0..=2.0"));
        }
    }
}

fn validate_search(config: &ReframeConfig, report: &mut ValidationReport) {
    let search = &config.search;
    if !matches!(search.depth.as_str(), "basic" | "advanced") {
        report.error(
            "search.depth",
            format!("Unknown search depth '{}'. Use 'basic' or 'advanced'", search.depth),
        );
    }
    if search.max_results == 0 || search.max_results > MAX_SEARCH_RESULTS {
        report.error(
            "search.maxResults",
            format!("maxResults must be within 1..={MAX_SEARCH_RESULTS}"),
        );
    }
    if search.timeout_secs == 0 {
        report.error("search.timeoutSecs", "timeoutSecs must be > 0");
    }
}

fn validate_feedback(config: &ReframeConfig, report: &mut ValidationReport) {
    let fb = &config.feedback;
    if fb.observer_window == 0 {
        report.error("feedback.observerWindow", "observerWindow must be >= 1");
    }
    if fb.max_reasoning_iterations == 0 {
        report.error(
            "feedback.maxReasoningIterations",
            "maxReasoningIterations must be >= 1",
        );
    }
    if fb.persona_window == 0 {
        report.warn(
            "feedback.personaWindow",
            "personaWindow is 0; the persona will see no history",
        );
    }
    if fb.min_instruction_chars == 0 {
        report.warn(
            "feedback.minInstructionChars",
            "minInstructionChars is 0; only blank rewrites will be rejected",
        );
    }
}

fn validate_persona(config: &ReframeConfig, report: &mut ValidationReport) {
    if let Some(text) = &config.persona.initial_instructions {
        if text.trim().is_empty() {
            report.error("persona.initialInstructions", "Initial instructions cannot be blank");
        }
    }
}

fn validate_retry(config: &ReframeConfig, report: &mut ValidationReport) {
    let retry = &config.retry;
    if retry.max_attempts == 0 {
        report.error("retry.maxAttempts", "maxAttempts must be >= 1");
    }
    if retry.backoff_factor < 1.0 {
        report.warn("retry.backoffFactor", "backoffFactor < 1.0 shrinks delays between attempts");
    }
}

/// Env-var names of the credentials that are absent.
pub fn missing_credentials(config: &ReframeConfig) -> Vec<String> {
    let creds = &config.credentials;
    [
        (TELEGRAM_TOKEN, &creds.telegram_token),
        (OPENAI_API_KEY, &creds.openai_api_key),
        (TAVILY_API_KEY, &creds.tavily_api_key),
    ]
    .into_iter()
    .filter(|(_, v)| v.as_deref().map(str::trim).unwrap_or("").is_empty())
    .map(|(name, _)| name.to_string())
    .collect()
}

/// Startup gate: all three credentials or a fatal `ConfigurationMissing`.
pub fn require_credentials(config: &ReframeConfig) -> Result<Credentials, ReframeError> {
    let missing = missing_credentials(config);
    if !missing.is_empty() {
        return Err(ReframeError::ConfigurationMissing(missing));
    }
    let creds = &config.credentials;
    Ok(Credentials {
        openai_api_key: creds.openai_api_key.clone().unwrap_or_default(),
        tavily_api_key: creds.tavily_api_key.clone().unwrap_or_default(),
        telegram_token: creds.telegram_token.clone().unwrap_or_default(),
    })
}
