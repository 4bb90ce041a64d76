//! Host command/event envelopes exchanged with the browser extension.

use serde::{Deserialize, Serialize};

/// Command set understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandName {
    Ping,
    ExplainText,
    SaveWord,
    ListWords,
    DeleteWord,
    ClearWords,
    VocabStats,
    TestTelegram,
    RescheduleAlarm,
    FetchTranscript,
    TranslateTranscript,
    ChatMessage,
    GetSettings,
    UpdateSettings,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::ExplainText => "EXPLAIN_TEXT",
            Self::SaveWord => "SAVE_WORD",
            Self::ListWords => "LIST_WORDS",
            Self::DeleteWord => "DELETE_WORD",
            Self::ClearWords => "CLEAR_WORDS",
            Self::VocabStats => "VOCAB_STATS",
            Self::TestTelegram => "TEST_TELEGRAM",
            Self::RescheduleAlarm => "RESCHEDULE_ALARM",
            Self::FetchTranscript => "FETCH_TRANSCRIPT",
            Self::TranslateTranscript => "TRANSLATE_TRANSCRIPT",
            Self::ChatMessage => "CHAT_MESSAGE",
            Self::GetSettings => "GET_SETTINGS",
            Self::UpdateSettings => "UPDATE_SETTINGS",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PING" => Some(Self::Ping),
            "EXPLAIN_TEXT" => Some(Self::ExplainText),
            "SAVE_WORD" => Some(Self::SaveWord),
            "LIST_WORDS" => Some(Self::ListWords),
            "DELETE_WORD" => Some(Self::DeleteWord),
            "CLEAR_WORDS" => Some(Self::ClearWords),
            "VOCAB_STATS" => Some(Self::VocabStats),
            "TEST_TELEGRAM" => Some(Self::TestTelegram),
            "RESCHEDULE_ALARM" => Some(Self::RescheduleAlarm),
            "FETCH_TRANSCRIPT" => Some(Self::FetchTranscript),
            "TRANSLATE_TRANSCRIPT" => Some(Self::TranslateTranscript),
            "CHAT_MESSAGE" => Some(Self::ChatMessage),
            "GET_SETTINGS" => Some(Self::GetSettings),
            "UPDATE_SETTINGS" => Some(Self::UpdateSettings),
            _ => None,
        }
    }
}

/// A command envelope from front end -> host.
///
/// `type` is kept as a raw string so an unknown command still produces an
/// error response carrying the caller's `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "type")]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            command: command.as_str().to_owned(),
            request_id: Some(request_id.into()),
            payload,
        }
    }
}

/// A response envelope from host -> front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub request_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            request_id: request_id.into(),
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// An unsolicited event from host -> front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build an event with a fresh id.
    #[must_use]
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event: event.into(),
            payload,
        }
    }
}
