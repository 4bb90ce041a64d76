//! Command handlers: payload decoding and dispatch into [`AppState`].

use crate::app::AppState;
use crate::config::KelimeConfig;
use crate::context::extract_sentence;
use crate::digest::DigestTrigger;
use crate::error::{KelimeError, Result};
use crate::host::contract::CommandName;
use crate::llm::{ChatMessage, ExplainMode, ExplainRequest};
use chrono::Local;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplainPayload {
    selected_text: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    surrounding_text: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveWordPayload {
    word: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListWordsPayload {
    #[serde(default)]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteWordPayload {
    id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptPayload {
    track_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    messages: Vec<ChatMessage>,
}

fn decode<T: DeserializeOwned>(command: CommandName, payload: &Value) -> Result<T> {
    let payload = if payload.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        payload.clone()
    };
    serde_json::from_value(payload).map_err(|e| {
        KelimeError::Validation(format!("invalid {} payload: {e}", command.as_str()))
    })
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| KelimeError::Parse(format!("serialize response: {e}")))
}

/// Recursively overlay `patch` onto `base`. Objects merge key by key;
/// everything else replaces.
fn merge_json(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_json(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Apply a partial settings object to `current`.
pub fn apply_settings_patch(current: &KelimeConfig, patch: &Value) -> Result<KelimeConfig> {
    if !patch.is_object() {
        return Err(KelimeError::Validation(
            "settings patch must be an object".to_owned(),
        ));
    }
    let mut merged = to_value(current)?;
    merge_json(&mut merged, patch);
    serde_json::from_value(merged)
        .map_err(|e| KelimeError::Validation(format!("invalid settings: {e}")))
}

/// Routes decoded commands to the application components.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    app: AppState,
}

impl CommandRouter {
    pub fn new(app: AppState) -> Self {
        Self { app }
    }

    #[must_use]
    pub fn app(&self) -> &AppState {
        &self.app
    }

    /// Handle one command and return its `data` value.
    pub async fn handle(&self, command: CommandName, payload: &Value) -> Result<Value> {
        match command {
            CommandName::Ping => Ok(json!({"pong": true})),
            CommandName::ExplainText => self.explain_text(decode(command, payload)?).await,
            CommandName::SaveWord => self.save_word(decode(command, payload)?).await,
            CommandName::ListWords => {
                let p: ListWordsPayload = decode(command, payload)?;
                to_value(&self.app.store.list_all(p.filter.as_deref()).await?)
            }
            CommandName::DeleteWord => {
                let p: DeleteWordPayload = decode(command, payload)?;
                let deleted = self.app.store.delete(p.id).await?;
                Ok(json!({"deleted": deleted}))
            }
            CommandName::ClearWords => {
                self.app.store.clear().await?;
                Ok(json!({"cleared": true}))
            }
            CommandName::VocabStats => to_value(&self.app.store.stats(Local::now()).await?),
            CommandName::TestTelegram => {
                let sent = self.app.digest.run(DigestTrigger::Manual).await?;
                Ok(json!({"sent": sent}))
            }
            CommandName::RescheduleAlarm => {
                let next_fire = self.app.scheduler.reschedule()?;
                Ok(json!({"next_fire": next_fire.to_rfc3339()}))
            }
            CommandName::FetchTranscript => {
                let p: TranscriptPayload = decode(command, payload)?;
                to_value(&self.app.transcripts.fetch(&p.track_url).await?)
            }
            CommandName::TranslateTranscript => {
                let p: TranscriptPayload = decode(command, payload)?;
                let translated = self
                    .app
                    .transcripts
                    .fetch_and_translate(&p.track_url, self.app.llm.as_ref())
                    .await?;
                to_value(&translated)
            }
            CommandName::ChatMessage => {
                let p: ChatPayload = decode(command, payload)?;
                Ok(Value::String(self.app.llm.chat(&p.messages).await?))
            }
            CommandName::GetSettings => Ok(self.app.settings.current().redacted()),
            CommandName::UpdateSettings => self.update_settings(payload),
        }
    }

    async fn explain_text(&self, p: ExplainPayload) -> Result<Value> {
        let config = self.app.settings.current();
        if !config.explain.enabled {
            return Err(KelimeError::Validation("explain is disabled".to_owned()));
        }
        let mode = match p.mode.as_deref() {
            Some(raw) => ExplainMode::parse(raw)?,
            None => config.explain.mode,
        };
        let context = match (p.context, p.surrounding_text) {
            (Some(context), _) if !context.trim().is_empty() => context,
            (_, Some(surrounding)) if !surrounding.trim().is_empty() => {
                extract_sentence(&surrounding, p.selected_text.trim())
            }
            _ => String::new(),
        };

        let explanation = self
            .app
            .llm
            .explain(&ExplainRequest {
                selected_text: p.selected_text,
                context,
                mode,
            })
            .await?;
        Ok(Value::String(explanation))
    }

    async fn save_word(&self, p: SaveWordPayload) -> Result<Value> {
        let saved = self
            .app
            .store
            .insert(&p.word, &p.explanation, p.context.as_deref().unwrap_or_default())
            .await?;
        Ok(json!({"saved": saved}))
    }

    fn update_settings(&self, patch: &Value) -> Result<Value> {
        let (before, updated) = self.app.settings.try_update(|config| {
            *config = apply_settings_patch(config, patch)?;
            Ok(())
        })?;

        if (before.digest.send_hour, before.digest.send_minute)
            != (updated.digest.send_hour, updated.digest.send_minute)
        {
            let next_fire = self.app.scheduler.reschedule()?;
            info!(next_fire = %next_fire, "send time changed, daily alarm rescheduled");
        }
        Ok(updated.redacted())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn patch_merges_nested_sections() {
        let current = KelimeConfig::default();
        let patch = json!({"telegram": {"chat_id": "123"}, "digest": {"send_hour": 9}});
        let next = apply_settings_patch(&current, &patch).unwrap();
        assert_eq!(next.telegram.chat_id.as_deref(), Some("123"));
        assert_eq!(next.telegram.base_url, current.telegram.base_url);
        assert_eq!(next.digest.send_hour, 9);
        assert_eq!(next.digest.send_minute, 0);
    }

    #[test]
    fn patch_rejects_unknown_mode() {
        let patch = json!({"explain": {"mode": "summarize"}});
        assert!(matches!(
            apply_settings_patch(&KelimeConfig::default(), &patch),
            Err(KelimeError::Validation(_))
        ));
    }

    #[test]
    fn patch_must_be_object() {
        assert!(apply_settings_patch(&KelimeConfig::default(), &json!([1, 2])).is_err());
    }

    #[test]
    fn null_payload_decodes_as_empty_object() {
        let p: ListWordsPayload = decode(CommandName::ListWords, &Value::Null).unwrap();
        assert!(p.filter.is_none());
        assert!(decode::<DeleteWordPayload>(CommandName::DeleteWord, &Value::Null).is_err());
    }
}
