//! Persona responder: answers the user, consulting web search when the
//! message asks for facts.

use std::sync::Arc;

use reframe_core::{ConversationTurn, LlmProvider, ReframeError, SearchHit, SearchProvider};
use reframe_tools::format_observation;
use tracing::{debug, info, warn};

use crate::context_window::ContextWindow;
use crate::heuristics::{should_search, KeywordSet};
use crate::settings::{LoopSettings, ModelSettings};
use crate::system_prompt::{PromptBuilder, SEARCH_TOOL_NAME};

const STAGE: &str = "persona";

const ANSWER_MARKERS: &[&str] = &["Ответ:", "Final Answer:"];
const ACTION_PREFIXES: &[&str] = &["Действие:", "Action:"];
const ACTION_INPUT_PREFIXES: &[&str] = &["Данные действия:", "Action Input:"];
const THOUGHT_PREFIXES: &[&str] = &["Мысли:", "Thought:"];
const SEARCH_UNAVAILABLE: &str = "Поиск временно недоступен.";
const MAX_SOURCES: usize = 5;

/// One lookup made while answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTrace {
    pub query: String,
    pub hits: usize,
}

#[derive(Debug, Clone)]
pub struct PersonaAnswer {
    pub text: String,
    pub searches: Vec<SearchTrace>,
}

pub struct PersonaResponder {
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    model: ModelSettings,
    triggers: KeywordSet,
    max_iterations: usize,
}

impl PersonaResponder {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        settings: &LoopSettings,
    ) -> Self {
        Self {
            llm,
            search,
            model: settings.persona.clone(),
            triggers: settings.search_triggers.clone(),
            max_iterations: settings.max_reasoning_iterations.max(1),
        }
    }

    /// Reply to `user_text` under `instructions`, given the preceding turns.
    pub async fn respond(
        &self,
        instructions: &str,
        history: &[ConversationTurn],
        user_text: &str,
    ) -> Result<PersonaAnswer, ReframeError> {
        let history = ContextWindow::build(history, history.len()).render();
        if should_search(&self.triggers, user_text) {
            info!(keyword = ?self.triggers.first_match(user_text), "Search gate matched");
            self.answer_with_search(instructions, &history, user_text).await
        } else {
            self.answer_directly(instructions, &history, user_text).await
        }
    }

    async fn answer_directly(
        &self,
        instructions: &str,
        history: &str,
        user_text: &str,
    ) -> Result<PersonaAnswer, ReframeError> {
        let request = self
            .model
            .request(instructions, PromptBuilder::persona_direct(history, user_text));
        let response = self.llm.complete(&request).await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(ReframeError::degenerate(STAGE, "empty reply"));
        }
        Ok(PersonaAnswer {
            text: text.to_string(),
            searches: Vec::new(),
        })
    }

    async fn answer_with_search(
        &self,
        instructions: &str,
        history: &str,
        user_text: &str,
    ) -> Result<PersonaAnswer, ReframeError> {
        let mut scratchpad = String::new();
        let mut hits: Vec<SearchHit> = Vec::new();
        let mut searches = Vec::new();

        // The gate guarantees one lookup on the raw message before reasoning.
        let observation = self.lookup(user_text, &mut hits, &mut searches).await;
        scratchpad.push_str(&scratch_entry("Нужно проверить информацию.", user_text, &observation));

        let mut partial: Option<String> = None;
        for iteration in 1..=self.max_iterations {
            let prompt = PromptBuilder::persona_reasoning(history, user_text, &scratchpad);
            let response = self.llm.complete(&self.model.request(instructions, prompt)).await?;
            debug!(iteration, chars = response.content.len(), "Reasoning step");

            match parse_step(&response.content) {
                Step::Answer(text) => {
                    return Ok(PersonaAnswer {
                        text: attach_sources(text, &hits),
                        searches,
                    });
                }
                Step::Search { query, thought } => {
                    if !thought.is_empty() {
                        partial = Some(thought.clone());
                    }
                    if iteration == self.max_iterations {
                        break;
                    }
                    let observation = self.lookup(&query, &mut hits, &mut searches).await;
                    scratchpad.push_str(&scratch_entry(&thought, &query, &observation));
                }
                Step::Empty => {}
            }
        }

        warn!(iterations = self.max_iterations, "Reasoning budget exhausted");
        let text = partial.or_else(|| digest(&hits)).ok_or_else(|| {
            ReframeError::degenerate(STAGE, "no answer within the reasoning budget")
        })?;
        Ok(PersonaAnswer {
            text: attach_sources(text, &hits),
            searches,
        })
    }

    /// Run one search, remembering the hits; failures become an observation.
    async fn lookup(
        &self,
        query: &str,
        hits: &mut Vec<SearchHit>,
        searches: &mut Vec<SearchTrace>,
    ) -> String {
        match self.search.search(query).await {
            Ok(found) => {
                info!(query, hits = found.len(), provider = self.search.name(), "Search performed");
                let observation = format_observation(&found);
                searches.push(SearchTrace {
                    query: query.to_string(),
                    hits: found.len(),
                });
                hits.extend(found);
                observation
            }
            Err(e) => {
                warn!(query, error = %e, "Search failed, answering without results");
                searches.push(SearchTrace {
                    query: query.to_string(),
                    hits: 0,
                });
                SEARCH_UNAVAILABLE.to_string()
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Answer(String),
    Search { query: String, thought: String },
    Empty,
}

fn scratch_entry(thought: &str, query: &str, observation: &str) -> String {
    format!(
        "Мысли: {thought}\nДействие: {SEARCH_TOOL_NAME}\nДанные действия: {query}\nНаблюдение: {observation}\n"
    )
}

fn parse_step(output: &str) -> Step {
    let output = output.trim();

    let marked = ANSWER_MARKERS
        .iter()
        .filter_map(|m| output.rfind(m).map(|pos| (pos, pos + m.len())))
        .max_by_key(|&(_, end)| end);
    // An empty final marker leaves only the text before it to read.
    let body = match marked {
        Some((pos, end)) => {
            let answer = output[end..].trim();
            if !answer.is_empty() {
                return Step::Answer(answer.to_string());
            }
            &output[..pos]
        }
        None => output,
    };

    let mut action = None;
    let mut input = None;
    let mut thought = Vec::new();
    for line in body.lines().map(str::trim) {
        if let Some(rest) = strip_any(line, ANSWER_MARKERS) {
            if !rest.is_empty() {
                thought.push(rest);
            }
        } else if let Some(rest) = strip_any(line, ACTION_PREFIXES) {
            action = Some(rest);
        } else if let Some(rest) = strip_any(line, ACTION_INPUT_PREFIXES) {
            input = Some(rest);
        } else if line.starts_with("Наблюдение:") || line.starts_with("Observation:") {
            // The model must not invent observations; stop reading here.
            break;
        } else if let Some(rest) = strip_any(line, THOUGHT_PREFIXES) {
            thought.push(rest);
        } else if !line.is_empty() {
            thought.push(line);
        }
    }
    let thought = thought.join("\n");

    match (action, input) {
        (Some(tool), Some(query)) if tool.contains(SEARCH_TOOL_NAME) && !query.is_empty() => {
            Step::Search {
                query: query.trim_matches('"').to_string(),
                thought,
            }
        }
        _ if !thought.is_empty() => Step::Answer(thought),
        _ => Step::Empty,
    }
}

fn strip_any<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|p| line.strip_prefix(p))
        .map(str::trim)
}

/// Fallback reply listing the gathered results when reasoning produced no text.
fn digest(hits: &[SearchHit]) -> Option<String> {
    let mut unique: Vec<SearchHit> = Vec::new();
    for hit in hits {
        if !unique.iter().any(|u| u.url == hit.url) {
            unique.push(hit.clone());
        }
        if unique.len() == MAX_SOURCES {
            break;
        }
    }
    if unique.is_empty() {
        return None;
    }
    Some(format!(
        "Вот что удалось найти по вашему вопросу:\n{}",
        format_observation(&unique)
    ))
}

/// Append a source list unless the answer already cites a returned URL.
fn attach_sources(text: String, hits: &[SearchHit]) -> String {
    if hits.is_empty() || hits.iter().any(|h| text.contains(&h.url)) {
        return text;
    }
    let mut urls: Vec<&str> = Vec::new();
    for hit in hits {
        if !urls.contains(&hit.url.as_str()) {
            urls.push(&hit.url);
        }
        if urls.len() == MAX_SOURCES {
            break;
        }
    }
    let list = urls
        .iter()
        .map(|u| format!("- {u}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{text}\n\nИсточники:\n{list}")
}
