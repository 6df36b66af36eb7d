//! Quality observer: a supervisor pass over the recent transcript.

use std::sync::Arc;

use reframe_core::{LlmProvider, ReframeError};
use tracing::debug;

use crate::settings::{LoopSettings, ModelSettings};
use crate::system_prompt::PromptBuilder;

pub struct QualityObserver {
    llm: Arc<dyn LlmProvider>,
    model: ModelSettings,
}

impl QualityObserver {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: &LoopSettings) -> Self {
        Self {
            llm,
            model: settings.observer.clone(),
        }
    }

    /// Free-text feedback on `dialogue` (rendered transcript lines).
    pub async fn review(&self, dialogue: &str) -> Result<String, ReframeError> {
        let request = self.model.request("", PromptBuilder::observer(dialogue));
        let response = self.llm.complete(&request).await?;
        debug!(chars = response.content.len(), "Observer feedback received");
        Ok(response.content.trim().to_string())
    }
}
