//! Bot-facing façade: greeting, message handling, and direct search.

use std::sync::Arc;

use anyhow::{Context, Result};
use reframe_core::{ReplySink, SearchProvider};
use reframe_memory::{DialogLog, DialogRecord, DialogRole};
use reframe_tools::format_results;
use tracing::{info, warn};

use crate::feedback_loop::FeedbackLoop;
use crate::session_registry::SessionRegistry;

pub const GREETING: &str = "Привет! Я AI-терапевт. Расскажи, что тебя беспокоит.";

pub const HELP: &str = "Я AI-терапевт. Просто напишите, что вас беспокоит, и я отвечу.\n\n\
Команды:\n\
/start - начать разговор\n\
/search <запрос> - найти информацию в интернете\n\
/help - эта справка";

pub const SEARCH_USAGE: &str = "Пожалуйста, укажите поисковый запрос после команды. Например: /search методики когнитивно-поведенческой терапии";

pub const SEARCH_FAILED: &str =
    "Произошла ошибка при выполнении поиска. Пожалуйста, попробуйте позже.";

pub struct TherapyService {
    feedback_loop: FeedbackLoop,
    sessions: SessionRegistry,
    search: Arc<dyn SearchProvider>,
    dialog_log: Arc<dyn DialogLog>,
}

impl TherapyService {
    pub fn new(
        feedback_loop: FeedbackLoop,
        search: Arc<dyn SearchProvider>,
        dialog_log: Arc<dyn DialogLog>,
    ) -> Self {
        Self {
            feedback_loop,
            sessions: SessionRegistry::new(),
            search,
            dialog_log,
        }
    }

    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    pub fn help(&self) -> &'static str {
        HELP
    }

    pub fn feedback_loop(&self) -> &FeedbackLoop {
        &self.feedback_loop
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Run one full turn for `user_id`, delivering the reply before the
    /// review starts and the correction notice after it.
    pub async fn handle_message(&self, user_id: i64, text: &str, sink: &dyn ReplySink) -> Result<()> {
        let conversation = self.sessions.conversation(user_id).await;
        let mut conversation = conversation.lock().await;

        self.record(user_id, DialogRole::User, text).await;
        let reply = self.feedback_loop.respond(&mut conversation, text).await;

        let sent = sink.send(&reply.text).await;
        let role = if reply.recorded {
            DialogRole::Persona
        } else {
            DialogRole::Notice
        };
        // The transcript already holds the reply, so the log must too.
        self.record(user_id, role, &reply.text).await;
        sent.context("Failed to deliver reply")?;

        if !reply.recorded {
            return Ok(());
        }

        let review = self.feedback_loop.review(&mut conversation).await;
        if let Some(notice) = review.notice() {
            sink.send(notice).await.context("Failed to deliver correction notice")?;
            self.record(user_id, DialogRole::Notice, notice).await;
        }
        Ok(())
    }

    /// Formatted search results for `query`, bypassing the persona.
    pub async fn search(&self, query: &str) -> String {
        match self.search.search(query).await {
            Ok(hits) => {
                info!(query, hits = hits.len(), "Direct search complete");
                format_results(&hits)
            }
            Err(e) => {
                warn!(query, error = %e, kind = e.kind(), "Direct search failed");
                SEARCH_FAILED.to_string()
            }
        }
    }

    /// The `/search` command: usage hint, progress line, then results.
    pub async fn handle_search(
        &self,
        user_id: i64,
        query: Option<&str>,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            sink.send(SEARCH_USAGE).await.context("Failed to deliver usage hint")?;
            return Ok(());
        };

        sink.send(&format!("🔍 Ищу информацию по запросу: '{query}'..."))
            .await
            .context("Failed to deliver search progress")?;

        let results = self.search(query).await;
        sink.send(&results).await.context("Failed to deliver search results")?;
        self.record(user_id, DialogRole::Search, &results).await;
        Ok(())
    }

    /// Best-effort dialog log write.
    async fn record(&self, user_id: i64, role: DialogRole, message: &str) {
        if let Err(e) = self
            .dialog_log
            .append(DialogRecord::new(user_id, role, message))
            .await
        {
            warn!(user_id, role = %role, error = %e, "Failed to write dialog record");
        }
    }
}
