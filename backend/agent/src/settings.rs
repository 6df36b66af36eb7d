//! Runtime knobs for the pipeline stages, derived from the loaded config.

use reframe_config::ReframeConfig;
use reframe_core::LlmRequest;

use crate::heuristics::KeywordSet;
use crate::system_prompt::DEFAULT_INSTRUCTIONS;

/// Model and sampling used by one stage.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelSettings {
    pub fn new(model_name: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model_name: model_name.into(),
            max_tokens,
            temperature,
        }
    }

    pub fn request(&self, system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> LlmRequest {
        LlmRequest {
            model: self.model_name.clone(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Everything the feedback loop needs besides its providers.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub persona: ModelSettings,
    pub observer: ModelSettings,
    pub corrector: ModelSettings,
    pub persona_window: usize,
    pub observer_window: usize,
    pub max_reasoning_iterations: usize,
    pub min_instruction_chars: usize,
    pub search_triggers: KeywordSet,
    pub problem_triggers: KeywordSet,
    pub initial_instructions: String,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&ReframeConfig::default())
    }
}

impl LoopSettings {
    pub fn from_config(config: &ReframeConfig) -> Self {
        let model = &config.model;
        let feedback = &config.feedback;
        Self {
            persona: ModelSettings::new(&model.name, model.max_tokens, model.persona_temperature),
            observer: ModelSettings::new(&model.name, model.max_tokens, model.observer_temperature),
            corrector: ModelSettings::new(&model.name, model.max_tokens, model.corrector_temperature),
            persona_window: feedback.persona_window,
            observer_window: feedback.observer_window,
            max_reasoning_iterations: feedback.max_reasoning_iterations.max(1),
            min_instruction_chars: feedback.min_instruction_chars,
            search_triggers: KeywordSet::from_override(
                config.search.keywords.as_deref(),
                KeywordSet::search_triggers,
            ),
            problem_triggers: KeywordSet::from_override(
                feedback.problem_keywords.as_deref(),
                KeywordSet::problem_triggers,
            ),
            initial_instructions: config
                .persona
                .initial_instructions
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_INSTRUCTIONS)
                .to_string(),
        }
    }
}
