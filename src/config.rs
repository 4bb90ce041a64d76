//! Configuration types for the kelime host.

use crate::error::{KelimeError, Result};
use crate::llm::ExplainMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration persisted as `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KelimeConfig {
    /// LLM completion API settings.
    pub llm: LlmConfig,
    /// Telegram bot delivery settings.
    pub telegram: TelegramConfig,
    /// Explain-on-selection behaviour.
    pub explain: ExplainConfig,
    /// Daily digest policy and send time.
    pub digest: DigestConfig,
    /// Outbound HTTP settings shared by all clients.
    pub http: HttpConfig,
}

/// OpenAI-compatible chat completions settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key. Must start with `sk-` when set.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Base URL without the `/v1/...` suffix.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum completion tokens.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_owned(),
            base_url: "https://api.openai.com".to_owned(),
            temperature: 0.4,
            max_tokens: 400,
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub bot_token: Option<String>,
    /// Destination chat id (integer, optionally negative for groups).
    pub chat_id: Option<String>,
    /// Bot API base URL.
    pub base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            base_url: "https://api.telegram.org".to_owned(),
        }
    }
}

impl TelegramConfig {
    /// Returns `(bot_token, chat_id)` when both are configured and non-blank.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().map(str::trim).unwrap_or_default();
        let chat_id = self.chat_id.as_deref().map(str::trim).unwrap_or_default();
        if token.is_empty() || chat_id.is_empty() {
            return None;
        }
        Some((token, chat_id))
    }
}

/// Explain-on-selection settings mirrored from the extension popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    /// Default instruction template.
    pub mode: ExplainMode,
    /// Master on/off switch for the explain-on-selection feature.
    pub enabled: bool,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            mode: ExplainMode::Explain,
            enabled: true,
        }
    }
}

/// Largest digest the MarkdownV2 formatter fits in one Telegram message.
pub const MAX_DIGEST_ITEMS: usize = 10;

/// Longest freshness window accepted for digest selection.
pub const MAX_FRESHNESS_DAYS: i64 = 365;

/// Daily digest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Local hour of day (0-23) the digest is sent.
    pub send_hour: u32,
    /// Minute of hour (0-59).
    pub send_minute: u32,
    /// Maximum entries per digest.
    pub max_items: usize,
    /// Entries reviewed within this many days are not eligible.
    pub freshness_days: i64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            send_hour: 15,
            send_minute: 0,
            max_items: 5,
            freshness_days: 3,
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 20 }
    }
}

impl HttpConfig {
    /// Request timeout as a [`std::time::Duration`].
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Check a Telegram chat id: an integer, optionally prefixed with `-`.
pub fn validate_chat_id(chat_id: &str) -> Result<()> {
    let digits = chat_id.strip_prefix('-').unwrap_or(chat_id);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(KelimeError::Validation(format!(
            "chat id must be numeric, got `{chat_id}`"
        )));
    }
    Ok(())
}

/// Check an LLM API key carries the expected `sk-` prefix.
pub fn validate_api_key(key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(KelimeError::Validation("API key is empty".to_owned()));
    }
    if !key.starts_with("sk-") {
        return Err(KelimeError::Validation(
            "API key must start with `sk-`".to_owned(),
        ));
    }
    Ok(())
}

fn mask_secret(secret: Option<&str>) -> serde_json::Value {
    match secret.map(str::trim).filter(|s| !s.is_empty()) {
        None => serde_json::Value::Null,
        Some(s) => {
            let tail: String = s
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            serde_json::Value::String(format!("…{tail}"))
        }
    }
}

impl KelimeConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| KelimeError::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| KelimeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (see [`crate::kelime_dirs::config_file`]).
    pub fn default_config_path() -> PathBuf {
        crate::kelime_dirs::config_file()
    }

    /// Validate user-supplied values before they are persisted.
    pub fn validate(&self) -> Result<()> {
        if let Some(key) = self.llm.api_key.as_deref() {
            validate_api_key(key)?;
        }
        if let Some(token) = self.telegram.bot_token.as_deref()
            && token.trim().is_empty()
        {
            return Err(KelimeError::Validation("bot token is empty".to_owned()));
        }
        if let Some(chat_id) = self.telegram.chat_id.as_deref() {
            validate_chat_id(chat_id.trim())?;
        }
        if self.digest.send_hour > 23 {
            return Err(KelimeError::Validation(format!(
                "send_hour must be 0-23, got {}",
                self.digest.send_hour
            )));
        }
        if self.digest.send_minute > 59 {
            return Err(KelimeError::Validation(format!(
                "send_minute must be 0-59, got {}",
                self.digest.send_minute
            )));
        }
        if !(1..=MAX_DIGEST_ITEMS).contains(&self.digest.max_items) {
            return Err(KelimeError::Validation(format!(
                "max_items must be 1-{MAX_DIGEST_ITEMS}, got {}",
                self.digest.max_items
            )));
        }
        if !(0..=MAX_FRESHNESS_DAYS).contains(&self.digest.freshness_days) {
            return Err(KelimeError::Validation(format!(
                "freshness_days must be 0-{MAX_FRESHNESS_DAYS}, got {}",
                self.digest.freshness_days
            )));
        }
        Ok(())
    }

    /// JSON view of the settings with secrets masked, for front ends.
    #[must_use]
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "llm": {
                "api_key": mask_secret(self.llm.api_key.as_deref()),
                "model": self.llm.model,
                "base_url": self.llm.base_url,
                "temperature": self.llm.temperature,
                "max_tokens": self.llm.max_tokens,
            },
            "telegram": {
                "bot_token": mask_secret(self.telegram.bot_token.as_deref()),
                "chat_id": self.telegram.chat_id,
                "base_url": self.telegram.base_url,
            },
            "explain": {
                "mode": self.explain.mode.as_str(),
                "enabled": self.explain.enabled,
            },
            "digest": {
                "send_hour": self.digest.send_hour,
                "send_minute": self.digest.send_minute,
                "max_items": self.digest.max_items,
                "freshness_days": self.digest.freshness_days,
            },
            "http": {
                "timeout_secs": self.http.timeout_secs,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KelimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.digest.send_hour, 15);
        assert_eq!(config.digest.send_minute, 0);
        assert_eq!(config.digest.max_items, 5);
        assert_eq!(config.digest.freshness_days, 3);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.explain.enabled);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = KelimeConfig::default();
        config.telegram.bot_token = Some("123:abc".to_owned());
        config.telegram.chat_id = Some("-100200".to_owned());
        config.explain.mode = ExplainMode::Translate;
        config.digest.send_hour = 9;

        config.save_to_file(&path).unwrap();
        let loaded = KelimeConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = KelimeConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_or_default_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = KelimeConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, KelimeConfig::default());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            KelimeConfig::from_file(&path),
            Err(KelimeError::Config(_))
        ));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: KelimeConfig = toml::from_str(
            r#"
            [telegram]
            chat_id = "42"

            [explain]
            mode = "translate"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.chat_id.as_deref(), Some("42"));
        assert_eq!(config.telegram.base_url, "https://api.telegram.org");
        assert_eq!(config.explain.mode, ExplainMode::Translate);
        assert_eq!(config.digest.send_hour, 15);
    }

    #[test]
    fn chat_id_validation() {
        assert!(validate_chat_id("123456").is_ok());
        assert!(validate_chat_id("-1001234").is_ok());
        assert!(validate_chat_id("").is_err());
        assert!(validate_chat_id("-").is_err());
        assert!(validate_chat_id("12a4").is_err());
        assert!(validate_chat_id("+12").is_err());
    }

    #[test]
    fn api_key_requires_prefix() {
        assert!(validate_api_key("sk-abc").is_ok());
        assert!(matches!(
            validate_api_key("abc"),
            Err(KelimeError::Validation(_))
        ));
        assert!(validate_api_key("  ").is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_hour() {
        let mut config = KelimeConfig::default();
        config.digest.send_hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bounds_digest_policy() {
        let mut config = KelimeConfig::default();
        config.digest.max_items = MAX_DIGEST_ITEMS;
        config.digest.freshness_days = MAX_FRESHNESS_DAYS;
        assert!(config.validate().is_ok());

        config.digest.max_items = 100;
        assert!(matches!(config.validate(), Err(KelimeError::Validation(_))));
        config.digest.max_items = 0;
        assert!(config.validate().is_err());

        config.digest.max_items = 5;
        config.digest.freshness_days = 1_000_000_000;
        assert!(matches!(config.validate(), Err(KelimeError::Validation(_))));
        config.digest.freshness_days = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn credentials_require_both_values() {
        let mut telegram = TelegramConfig::default();
        assert!(telegram.credentials().is_none());
        telegram.bot_token = Some("tok".to_owned());
        assert!(telegram.credentials().is_none());
        telegram.chat_id = Some("  ".to_owned());
        assert!(telegram.credentials().is_none());
        telegram.chat_id = Some("7".to_owned());
        assert_eq!(telegram.credentials(), Some(("tok", "7")));
    }

    #[test]
    fn redacted_masks_secrets() {
        let mut config = KelimeConfig::default();
        config.llm.api_key = Some("sk-secretvalue1234".to_owned());
        let view = config.redacted();
        assert_eq!(view["llm"]["api_key"], "…1234");
        assert!(view["telegram"]["bot_token"].is_null());
        assert_eq!(view["explain"]["mode"], "explain");
    }
}
