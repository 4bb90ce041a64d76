use crate::error::Result;
use async_trait::async_trait;

/// Destination for an outbound message.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    /// Credentials from the `[telegram]` section, if both values are set.
    #[must_use]
    pub fn from_config(config: &crate::config::TelegramConfig) -> Option<Self> {
        config.credentials().map(|(token, chat_id)| Self {
            bot_token: token.to_owned(),
            chat_id: chat_id.to_owned(),
        })
    }
}

/// Outbound delivery contract. New channels only need to implement this trait.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Stable channel identifier (e.g. `telegram`).
    fn id(&self) -> &'static str;

    /// Deliver a pre-formatted message. Not retried on failure.
    async fn send(&self, credentials: &Credentials, text: &str) -> Result<()>;

    /// Best-effort credential probe.
    async fn health_check(&self, credentials: &Credentials) -> anyhow::Result<bool>;
}
