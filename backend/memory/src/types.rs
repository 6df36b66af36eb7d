use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of message a dialog row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogRole {
    User,
    Persona,
    /// System notice shown to the user, e.g. after a prompt correction.
    Notice,
    /// Output of the direct search command.
    Search,
}

impl DialogRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogRole::User => "user",
            DialogRole::Persona => "persona",
            DialogRole::Notice => "notice",
            DialogRole::Search => "search",
        }
    }
}

impl fmt::Display for DialogRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(DialogRole::User),
            "persona" => Ok(DialogRole::Persona),
            "notice" => Ok(DialogRole::Notice),
            "search" => Ok(DialogRole::Search),
            other => Err(format!("unknown dialog role: {other}")),
        }
    }
}

/// One persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogRecord {
    pub user_id: i64,
    pub message: String,
    pub role: DialogRole,
    pub timestamp: DateTime<Utc>,
}

impl DialogRecord {
    pub fn new(user_id: i64, role: DialogRole, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
            role,
            timestamp: Utc::now(),
        }
    }
}
