//! Fixed-size history windows.
//!
//! Older turns are dropped, never summarized.

use reframe_core::ConversationTurn;

pub struct ContextWindow<'a> {
    pub turns: &'a [ConversationTurn],
}

impl<'a> ContextWindow<'a> {
    /// The last `size` turns of `transcript`.
    pub fn build(transcript: &'a [ConversationTurn], size: usize) -> Self {
        let start = transcript.len().saturating_sub(size);
        Self {
            turns: &transcript[start..],
        }
    }

    /// One `"Клиент: ..."` / `"Психолог: ..."` line per turn.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(ConversationTurn::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
