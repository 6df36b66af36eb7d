use thiserror::Error;

/// Top-level error type for the Reframe runtime.
///
/// Every external call (model, search, storage) maps its failures onto one
/// of these variants so callers can decide between apologising, skipping a
/// review round, or halting at startup.
#[derive(Debug, Error)]
pub enum ReframeError {
    /// External service unreachable, timed out, or answered with garbage.
    #[error("transport failure ({service}): {message}")]
    Transport { service: String, message: String },

    /// Credential rejected or rate limit hit.
    #[error("quota or auth failure ({service}): {message}")]
    QuotaOrAuth { service: String, message: String },

    /// The model answered, but with nothing usable.
    #[error("degenerate output from {stage}: {reason}")]
    DegenerateOutput { stage: String, reason: String },

    /// Required credentials absent at startup.
    #[error("missing required configuration: {}", .0.join(", "))]
    ConfigurationMissing(Vec<String>),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReframeError {
    pub fn transport(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn quota_or_auth(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuotaOrAuth {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn degenerate(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateOutput {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Map a non-success HTTP status onto the taxonomy.
    ///
    /// Credential and rate-limit statuses become `QuotaOrAuth`; anything else
    /// is a transport problem.
    pub fn from_status(service: impl Into<String>, status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}: {}", truncate(body, 300));
        match status {
            401 | 402 | 403 | 429 => Self::quota_or_auth(service, message),
            _ => Self::transport(service, message),
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Short machine-friendly label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::QuotaOrAuth { .. } => "quota_or_auth",
            Self::DegenerateOutput { .. } => "degenerate_output",
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::Storage(_) => "storage",
            Self::Other(_) => "other",
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}…")
    }
}
