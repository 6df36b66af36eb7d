//! Per-user conversation state.

use std::fmt;

use reframe_core::{ConversationTurn, Speaker};

/// Where a conversation is in the respond/review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingPersonaReply,
    AwaitingObserverVerdict,
    Correcting,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::Idle => "idle",
            LoopState::AwaitingPersonaReply => "awaiting_persona_reply",
            LoopState::AwaitingObserverVerdict => "awaiting_observer_verdict",
            LoopState::Correcting => "correcting",
        };
        f.write_str(s)
    }
}

/// Transcript and loop state for one user.
///
/// Turns are append-only and numbered from 0 in insertion order.
#[derive(Debug)]
pub struct Conversation {
    user_id: i64,
    turns: Vec<ConversationTurn>,
    state: LoopState,
    /// States entered during the latest turn, starting from `Idle`.
    transitions: Vec<LoopState>,
}

impl Conversation {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            turns: Vec::new(),
            state: LoopState::Idle,
            transitions: vec![LoopState::Idle],
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn transitions(&self) -> &[LoopState] {
        &self.transitions
    }

    pub(crate) fn record(&mut self, speaker: Speaker, text: impl Into<String>) -> &ConversationTurn {
        let sequence = self.turns.len() as u64;
        self.turns.push(ConversationTurn::new(speaker, text, sequence));
        &self.turns[self.turns.len() - 1]
    }

    /// A new turn starts when the persona is asked for a reply; the previous
    /// cycle's history is dropped then.
    pub(crate) fn enter(&mut self, state: LoopState) {
        if state == LoopState::AwaitingPersonaReply {
            self.transitions.clear();
            self.transitions.push(LoopState::Idle);
        }
        self.state = state;
        self.transitions.push(state);
    }
}
