//! OpenAI chat completions client.
//!
//! Non-streaming `POST {base_url}/v1/chat/completions`. Credentials, model,
//! and sampling parameters are read from [`Settings`] on every call so that
//! `UPDATE_SETTINGS` takes effect without a restart.

use super::{ChatMessage, CompletionClient};
use crate::error::{KelimeError, Result};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "openai";

/// Chat completions client backed by the `[llm]` settings section.
#[derive(Clone)]
pub struct OpenAiClient {
    settings: Settings,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.settings.current();
        f.debug_struct("OpenAiClient")
            .field("model", &config.llm.model)
            .field("base_url", &config.llm.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// Map a non-success response to an upstream error.
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> KelimeError {
        let message = extract_error_message(body)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        KelimeError::upstream(SERVICE, message)
    }
}

/// `error.message` from an OpenAI error body, if present.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .filter(|m| !m.trim().is_empty())
}

/// Request body for a non-streaming completion.
pub fn build_completions_request(
    model: &str,
    messages: &[ChatMessage],
    temperature: f64,
    max_tokens: u32,
) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "max_tokens": max_tokens,
    })
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let config = self.settings.current();
        let api_key = config
            .llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| KelimeError::ConfigMissing("OpenAI API key".to_owned()))?;

        let url = format!(
            "{}/v1/chat/completions",
            config.llm.base_url.trim_end_matches('/')
        );
        let body = build_completions_request(
            &config.llm.model,
            messages,
            config.llm.temperature,
            config.llm.max_tokens,
        );

        debug!(model = %config.llm.model, messages = messages.len(), "openai request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(config.http.timeout())
            .json(&body)
            .send()
            .await
            .map_err(|e| KelimeError::upstream(SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Self::map_http_error(status, &body_text));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| KelimeError::Parse(format!("openai response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_owned())
            .ok_or_else(|| KelimeError::Parse("openai response has no choices".to_owned()))
    }
}
