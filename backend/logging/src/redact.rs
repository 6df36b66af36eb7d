//! Log Redaction Layer
//!
//! Scrubs API keys, bot tokens, and phone numbers from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(tvly-[a-zA-Z0-9_\-]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)")
        .unwrap()
});
/// Telegram bot tokens look like `123456789:AA...` (35 chars after the colon).
static BOT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{6,12}:[A-Za-z0-9_\-]{30,}").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // Tokens first: the numeric prefix of a bot token also looks like a phone.
    let mut redacted = BOT_TOKEN_RE
        .replace_all(input, "[REDACTED_BOT_TOKEN]")
        .to_string();

    redacted = API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();

    redacted = TELEPHONE_RE
        .replace_all(&redacted, "[REDACTED_PHONE]")
        .to_string();

    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "Sending to +1-555-123-4567 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("+1-555-123-4567"));
        assert!(!clean.contains("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
    }

    #[test]
    fn redacts_provider_keys() {
        let raw = "openai=sk-proj-abcdefghijklmnopqrstuvwx tavily=tvly-ABCDEFGHIJKLMNOPQRS";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("abcdefghijklmnop"));
        assert!(!clean.contains("ABCDEFGHIJKLMNOP"));
    }

    #[test]
    fn redacts_telegram_bot_token() {
        let raw = "token 123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0 rejected";
        let clean = redact_sensitive_data(raw);
        assert_eq!(clean, "token [REDACTED_BOT_TOKEN] rejected");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let raw = "Я чувствую тревогу уже третий день";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
