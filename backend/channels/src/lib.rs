use async_trait::async_trait;

pub mod chunking;
pub mod telegram;
pub mod telegram_commands;

pub use chunking::{split_message, TELEGRAM_MESSAGE_LIMIT};
pub use telegram::{TelegramAdapter, TelegramSink};
pub use telegram_commands::{parse_command, BotCommand};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Run the adapter until shutdown (polling loop, Ctrl-C, etc.).
    async fn start(&self) -> anyhow::Result<()>;
}
