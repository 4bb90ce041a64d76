//! Kelime: selection explainer and daily vocabulary digest host.
//!
//! A browser extension sends selected text (often a YouTube caption line)
//! to this host, which asks an OpenAI-compatible API for a Turkish
//! explanation. Saved words are resent once a day as a Telegram digest.
//!
//! # Architecture
//!
//! Components are wired together in [`app::AppState`]:
//! - **Vocabulary store**: single-writer actor over a bounded JSON list
//! - **Digest**: freshness-biased selection, MarkdownV2 formatting, delivery
//! - **Scheduler**: daily wall-clock alarm driving the digest
//! - **LLM**: explain/translate prompts and follow-up chat
//! - **Host**: newline-delimited JSON command bridge over stdio

pub mod app;
pub mod channels;
pub mod config;
pub mod context;
pub mod digest;
pub mod error;
pub mod host;
pub mod kelime_dirs;
pub mod llm;
pub mod scheduler;
pub mod settings;
pub mod transcript;
pub mod vocabulary;

pub use app::AppState;
pub use config::KelimeConfig;
pub use error::{KelimeError, Result};
