use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a given line of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Persona,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Persona => "persona",
        }
    }

    /// Label used when a transcript is rendered into a prompt.
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Speaker::User => "Клиент",
            Speaker::Persona => "Психолог",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded user or persona message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    speaker: Speaker,
    text: String,
    sequence: u64,
    recorded_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>, sequence: u64) -> Self {
        Self {
            speaker,
            text: text.into(),
            sequence,
            recorded_at: Utc::now(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// `"Клиент: ..."` / `"Психолог: ..."`
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.speaker.transcript_label(), self.text)
    }
}

/// A single ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}
