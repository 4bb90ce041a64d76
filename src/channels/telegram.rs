//! Telegram Bot API delivery.
//!
//! Messages are sent with `parse_mode: MarkdownV2`, so every piece of user
//! text must go through [`escape_markdown_v2`] first.

use crate::channels::traits::{Credentials, DeliveryChannel};
use crate::error::{KelimeError, Result};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const SERVICE: &str = "telegram";

/// Longest message body the Bot API accepts.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Characters MarkdownV2 reserves. Each must be backslash-escaped in text.
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Prefix every MarkdownV2 reserved character with a backslash.
#[must_use]
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram delivery channel. Base URL and timeout come from [`Settings`].
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    settings: Settings,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        let base = self.settings.current().telegram.base_url;
        format!("{}/bot{token}/{method}", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    fn id(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, credentials: &Credentials, text: &str) -> Result<()> {
        let url = self.method_url(&credentials.bot_token, "sendMessage");
        let body = json!({
            "chat_id": credentials.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
        });

        debug!(chat_id = %credentials.chat_id, chars = text.chars().count(), "telegram sendMessage");
        let response = self
            .client
            .post(&url)
            .timeout(self.settings.current().http.timeout())
            .json(&body)
            .send()
            .await
            .map_err(|e| KelimeError::upstream(SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<BotApiResponse>(&body_text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|p| p.description)
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(KelimeError::upstream(SERVICE, message));
        }
        if let Some(parsed) = parsed
            && !parsed.ok
        {
            return Err(KelimeError::upstream(
                SERVICE,
                parsed
                    .description
                    .unwrap_or_else(|| "response not ok".to_owned()),
            ));
        }

        info!(chat_id = %credentials.chat_id, "telegram message delivered");
        Ok(())
    }

    async fn health_check(&self, credentials: &Credentials) -> anyhow::Result<bool> {
        if credentials.bot_token.trim().is_empty() {
            return Ok(false);
        }
        let response = self
            .client
            .get(self.method_url(&credentials.bot_token, "getMe"))
            .timeout(self.settings.current().http.timeout())
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let parsed: BotApiResponse = response.json().await?;
        Ok(parsed.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KelimeConfig;

    #[test]
    fn escapes_every_reserved_character() {
        let raw = "_*[]()~`>#+-=|{}.!\\";
        let escaped = escape_markdown_v2(raw);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            assert_eq!(c, '\\', "expected escape in {escaped}");
            let next = chars.next();
            assert!(next.is_some_and(|n| MARKDOWN_V2_RESERVED.contains(&n)));
        }
        assert_eq!(escaped.chars().count(), raw.chars().count() * 2);
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape_markdown_v2("Günlük tekrar 42"), "Günlük tekrar 42");
    }

    #[test]
    fn mixed_text() {
        assert_eq!(escape_markdown_v2("C++ (lang)."), "C\\+\\+ \\(lang\\)\\.");
    }

    #[test]
    fn method_url_trims_trailing_slash() {
        let mut config = KelimeConfig::default();
        config.telegram.base_url = "http://localhost:9000/".to_owned();
        let channel = TelegramChannel::new(Settings::in_memory(config));
        assert_eq!(
            channel.method_url("123:abc", "sendMessage"),
            "http://localhost:9000/bot123:abc/sendMessage"
        );
    }
}
