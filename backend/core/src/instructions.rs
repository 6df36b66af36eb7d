//! The live persona instruction string.
//!
//! One value is live at a time. Readers take an `Arc<str>` snapshot; the
//! lock is held only long enough to clone or swap the pointer, so no reader
//! can observe a partially written string and an in-flight request keeps
//! the snapshot it started with. Concurrent replacements are
//! last-writer-wins.

use std::sync::{Arc, RwLock};

use tracing::info;

#[derive(Debug)]
struct Versioned {
    text: Arc<str>,
    generation: u64,
}

/// A point-in-time view of the instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionsSnapshot {
    pub text: Arc<str>,
    /// 0 for the startup default, incremented by every replacement.
    pub generation: u64,
}

/// Shared handle to the process-wide persona instructions.
#[derive(Debug, Clone)]
pub struct PersonaInstructions {
    inner: Arc<RwLock<Versioned>>,
}

impl PersonaInstructions {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Versioned {
                text: Arc::from(initial.into()),
                generation: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> InstructionsSnapshot {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        InstructionsSnapshot {
            text: Arc::clone(&guard.text),
            generation: guard.generation,
        }
    }

    pub fn current(&self) -> Arc<str> {
        self.snapshot().text
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }

    /// Swap in a new instruction string, returning its generation.
    ///
    /// This is the only mutator. Validation happens before calling it.
    pub fn replace(&self, text: impl Into<String>) -> u64 {
        let text: Arc<str> = Arc::from(text.into());
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.text = text;
        guard.generation += 1;
        let generation = guard.generation;
        drop(guard);
        info!(generation, "Persona instructions replaced");
        generation
    }
}
