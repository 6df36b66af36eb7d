//! Reframe agent runtime
//!
//! The persona responder, quality observer, and prompt corrector, the
//! feedback loop that sequences them, and the per-user service façade the
//! channels talk to.

pub mod context_window;
pub mod corrector;
pub mod feedback_loop;
pub mod heuristics;
pub mod observer;
pub mod persona;
pub mod service;
pub mod session_registry;
pub mod session_state;
pub mod settings;
pub mod system_prompt;

pub use context_window::ContextWindow;
pub use corrector::{validate_instructions, PromptCorrector};
pub use feedback_loop::{
    Correction, FeedbackLoop, ObserverVerdict, PersonaReply, ReviewOutcome, TurnOutcome, APOLOGY,
    CORRECTION_NOTICE,
};
pub use heuristics::{problem_detected, should_search, KeywordSet};
pub use observer::QualityObserver;
pub use persona::{PersonaAnswer, PersonaResponder, SearchTrace};
pub use service::{TherapyService, GREETING, HELP, SEARCH_USAGE};
pub use session_registry::SessionRegistry;
pub use session_state::{Conversation, LoopState};
pub use settings::{LoopSettings, ModelSettings};
pub use system_prompt::{PromptBuilder, DEFAULT_INSTRUCTIONS};
