use std::sync::Arc;

use crate::chunking::{split_message, TELEGRAM_MESSAGE_LIMIT};
use crate::telegram_commands::{parse_command, BotCommand};
use crate::ChannelAdapter;
use async_trait::async_trait;
use reframe_agent::TherapyService;
use reframe_core::ReplySink;
use teloxide::prelude::*;
use tracing::{error, info, warn};

pub struct TelegramAdapter {
    bot: Bot,
    service: Arc<TherapyService>,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, service: Arc<TherapyService>) -> Self {
        Self {
            bot: Bot::new(token),
            service,
        }
    }
}

/// Delivers replies to one Telegram chat, splitting long text.
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramSink {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        for chunk in split_message(text, TELEGRAM_MESSAGE_LIMIT) {
            self.bot.send_message(self.chat_id, chunk).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!("Starting Telegram adapter");

        let handler = Update::filter_message().endpoint(
            |bot: Bot, msg: Message, service: Arc<TherapyService>| async move {
                if let Some(text) = msg.text() {
                    let chat_id = msg.chat.id;
                    let sink = TelegramSink::new(bot, chat_id);
                    if let Err(e) = route(&service, chat_id.0, text, &sink).await {
                        error!(chat_id = chat_id.0, error = %e, "Failed to handle Telegram message");
                    }
                } else {
                    warn!(chat_id = msg.chat.id.0, "Ignoring non-text Telegram message");
                }
                respond(())
            },
        );

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![self.service.clone()])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}

/// Commands first, then ordinary conversation.
pub async fn route(
    service: &TherapyService,
    user_id: i64,
    text: &str,
    sink: &dyn ReplySink,
) -> anyhow::Result<()> {
    match parse_command(text) {
        Some(BotCommand::Start) => sink.send(service.greeting()).await,
        Some(BotCommand::Help) => sink.send(service.help()).await,
        Some(BotCommand::Search(query)) => {
            info!(user_id, "Search command received");
            service.handle_search(user_id, query.as_deref(), sink).await
        }
        Some(BotCommand::Unknown(name)) => {
            info!(user_id, command = %name, "Unknown command");
            sink.send(service.help()).await
        }
        None => {
            info!(user_id, chars = text.chars().count(), "Message received");
            service.handle_message(user_id, text, sink).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use reframe_agent::{FeedbackLoop, LoopSettings, GREETING, HELP, SEARCH_USAGE};
    use reframe_memory::InMemoryDialogLog;
    use reframe_planner::MockProvider;
    use reframe_tools::MockSearchProvider;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send(&self, text: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn service() -> TherapyService {
        let llm = Arc::new(MockProvider::new("mock").with_response("Я вас слушаю."));
        let search = Arc::new(MockSearchProvider::new());
        let feedback_loop = FeedbackLoop::with_provider(llm, search.clone(), &LoopSettings::default());
        TherapyService::new(feedback_loop, search, Arc::new(InMemoryDialogLog::new()))
    }

    #[tokio::test]
    async fn start_and_help_bypass_the_persona() {
        let service = service();
        let sink = RecordingSink::default();

        route(&service, 1, "/start", &sink).await.unwrap();
        route(&service, 1, "/help@ReframeBot", &sink).await.unwrap();

        assert_eq!(sink.sent(), vec![GREETING, HELP]);
        assert!(service.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn plain_text_goes_to_the_feedback_loop() {
        let service = service();
        let sink = RecordingSink::default();

        route(&service, 1, "Мне грустно", &sink).await.unwrap();

        assert_eq!(sink.sent()[0], "Я вас слушаю.");
        let conversation = service.sessions().conversation(1).await;
        assert_eq!(conversation.lock().await.turns().len(), 2);
    }

    #[tokio::test]
    async fn search_without_query_shows_usage() {
        let service = service();
        let sink = RecordingSink::default();

        route(&service, 1, "/search", &sink).await.unwrap();

        assert_eq!(sink.sent(), vec![SEARCH_USAGE]);
    }

    #[tokio::test]
    async fn unknown_command_gets_help() {
        let service = service();
        let sink = RecordingSink::default();

        route(&service, 1, "/agent", &sink).await.unwrap();

        assert_eq!(sink.sent(), vec![HELP]);
    }
}
