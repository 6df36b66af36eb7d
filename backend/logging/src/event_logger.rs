//! Turn Event Logger
//!
//! Structured feedback-loop events (messages, verdicts, corrections, stage
//! failures) written through `tracing` under the `turn_events` target, which
//! the file layer persists as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Message {
        role: String,
        content: String,
    },
    SearchPerformed {
        query: String,
        hits: usize,
    },
    Verdict {
        problem_detected: bool,
        feedback_chars: usize,
    },
    CorrectionApplied {
        generation: u64,
        instruction_chars: usize,
    },
    CorrectionRejected {
        reason: String,
    },
    StageFailed {
        stage: String,
        error_kind: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct TurnEventEntry {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub event: TurnEvent,
}

pub struct TurnEventLogger;

impl TurnEventLogger {
    /// Redact free text in the event and emit it.
    pub fn log_event(user_id: i64, event: TurnEvent) -> TurnEventEntry {
        let event = Self::redacted(event);
        let entry = TurnEventEntry {
            user_id,
            timestamp: Utc::now(),
            event,
        };

        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "turn_events", user_id, event = %json, "Turn event");
        entry
    }

    fn redacted(mut event: TurnEvent) -> TurnEvent {
        match &mut event {
            TurnEvent::Message { content, .. } => {
                *content = redact_sensitive_data(content);
            }
            TurnEvent::SearchPerformed { query, .. } => {
                *query = redact_sensitive_data(query);
            }
            TurnEvent::CorrectionRejected { reason } => {
                *reason = redact_sensitive_data(reason);
            }
            TurnEvent::StageFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            TurnEvent::Verdict { .. } | TurnEvent::CorrectionApplied { .. } => {}
        }
        event
    }
}
