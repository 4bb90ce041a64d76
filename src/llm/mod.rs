//! Explain/translate and follow-up chat over an OpenAI-compatible API.

pub mod openai;
pub mod prompts;

pub use openai::OpenAiClient;
pub use prompts::{ExplainMode, build_user_prompt, chat_system_prompt, system_prompt};

use crate::error::{KelimeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat-completions conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A selection to explain or translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainRequest {
    pub selected_text: String,
    /// Surrounding sentence or caption line; may be empty.
    pub context: String,
    pub mode: ExplainMode,
}

/// A chat-completions backend.
///
/// Implementors provide [`complete`](Self::complete); explain and chat are
/// built on top of it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `messages` and return the trimmed text of the first choice.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Explain or translate a selection using the mode's template.
    async fn explain(&self, request: &ExplainRequest) -> Result<String> {
        let selected = request.selected_text.trim();
        if selected.is_empty() {
            return Err(KelimeError::Validation("selected text is empty".to_owned()));
        }
        let messages = [
            ChatMessage::system(system_prompt(request.mode)),
            ChatMessage::user(build_user_prompt(selected, &request.context, request.mode)),
        ];
        self.complete(&messages).await
    }

    /// Continue a caller-supplied conversation.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        if !messages.iter().any(|m| m.role == ChatRole::User) {
            return Err(KelimeError::Validation(
                "chat needs at least one user message".to_owned(),
            ));
        }
        self.complete(messages).await
    }
}
