//! Telemetry and structured logging for Reframe.
//!
//! Console + rolling NDJSON file output, secret redaction, and turn-level
//! events for the feedback loop.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{TurnEvent, TurnEventEntry, TurnEventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
