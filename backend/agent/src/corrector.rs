//! Prompt corrector: rewrites the persona instructions from observer
//! feedback.

use std::sync::Arc;

use reframe_core::{LlmProvider, ReframeError};
use tracing::debug;

use crate::settings::{LoopSettings, ModelSettings};
use crate::system_prompt::PromptBuilder;

const STAGE: &str = "corrector";

pub struct PromptCorrector {
    llm: Arc<dyn LlmProvider>,
    model: ModelSettings,
}

impl PromptCorrector {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: &LoopSettings) -> Self {
        Self {
            llm,
            model: settings.corrector.clone(),
        }
    }

    /// A full replacement for `old_instructions`. The output is returned as
    /// produced; see [`validate_instructions`].
    pub async fn rewrite(&self, old_instructions: &str, feedback: &str) -> Result<String, ReframeError> {
        let request = self
            .model
            .request("", PromptBuilder::corrector(old_instructions, feedback));
        let response = self.llm.complete(&request).await?;
        debug!(chars = response.content.len(), "Corrector output received");
        Ok(response.content)
    }
}

/// Trimmed instructions, or `DegenerateOutput` when too short to use.
pub fn validate_instructions(candidate: &str, min_chars: usize) -> Result<String, ReframeError> {
    let text = candidate.trim();
    if text.is_empty() {
        return Err(ReframeError::degenerate(STAGE, "empty rewrite"));
    }
    let chars = text.chars().count();
    if chars < min_chars {
        return Err(ReframeError::degenerate(
            STAGE,
            format!("rewrite has {chars} chars, need at least {min_chars}"),
        ));
    }
    Ok(text.to_string())
}
