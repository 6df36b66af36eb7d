//! Telegram Bot Commands
//!
//! Detects `/start`, `/help`, and `/search <query>` before a message is
//! treated as conversation. A `@BotName` suffix on the command is accepted.

/// A recognised slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    /// `None` when the query is missing or blank.
    Search(Option<String>),
    /// Any other `/word`.
    Unknown(String),
}

/// `None` for plain messages.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let text = text.trim_start();
    let rest = text.strip_prefix('/')?;

    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    if name.is_empty() {
        return None;
    }

    let command = match name.as_str() {
        "start" => BotCommand::Start,
        "help" => BotCommand::Help,
        "search" => BotCommand::Search((!args.is_empty()).then(|| args.to_string())),
        _ => BotCommand::Unknown(name),
    };
    Some(command)
}
