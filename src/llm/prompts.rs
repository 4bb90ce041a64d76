//! Instruction templates for the explain and translate modes.

use crate::error::{KelimeError, Result};
use serde::{Deserialize, Serialize};

/// Which instruction template to send with a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMode {
    /// Technical explanation in Turkish with details and an English definition.
    #[default]
    Explain,
    /// Natural Turkish translation with a technical-terms list.
    Translate,
}

impl ExplainMode {
    /// Wire name (`explain` / `translate`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::Translate => "translate",
        }
    }

    /// Parse a wire name.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "explain" => Ok(Self::Explain),
            "translate" => Ok(Self::Translate),
            other => Err(KelimeError::Validation(format!(
                "mode must be `explain` or `translate`, got `{other}`"
            ))),
        }
    }
}

impl std::fmt::Display for ExplainMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const EXPLAIN_SYSTEM_PROMPT: &str = "\
Sen bir teknik eğitim asistanısın. Kullanıcı sana bir YouTube teknik videosundan seçilmiş İngilizce bir kavram veya cümle verecek.
Görevin:
1. Kavramın teknik anlamını bağlama göre kısaca Türkçe açıkla (2-3 cümle)
2. 2-3 madde halinde teknik detay, örnek veya benzetme sun
3. (İsteğe bağlı) Tek satır İngilizce tanım ekle

Yanıtını KESINLIKLE şu formatta ver:

**Teknik Açıklama:**
[Türkçe açıklama]

**Detaylar:**
• [madde 1]
• [madde 2]
• [madde 3, örnek veya benzetme]

**English Definition:**
[one-line definition]";

const TRANSLATE_SYSTEM_PROMPT: &str = "\
Sen bir teknik çeviri asistanısın. Kullanıcı sana İngilizce teknik bir metin verecek.
Görevin:
1. Metni doğal Türkçeye çevir (kelimesi kelimesine değil, anlamlı ve akıcı)
2. Teknik terimleri kısa parantez notlarıyla açıkla (örn: \"CLI (komut satırı arayüzü)\")
3. Yanıtını şu formatta ver:

**Türkçe Çeviri:**
[çeviri buraya]

**Teknik Terimler:**
• [terim]: [kısa açıklama]
• [terim]: [kısa açıklama]";

/// System message for `mode`.
#[must_use]
pub fn system_prompt(mode: ExplainMode) -> &'static str {
    match mode {
        ExplainMode::Explain => EXPLAIN_SYSTEM_PROMPT,
        ExplainMode::Translate => TRANSLATE_SYSTEM_PROMPT,
    }
}

/// User message quoting the selection, with context when it adds anything.
#[must_use]
pub fn build_user_prompt(selected: &str, context: &str, mode: ExplainMode) -> String {
    let mut prompt = format!("Seçilen metin: \"{selected}\"");

    let context = context.trim();
    if !context.is_empty() && context != selected.trim() {
        prompt.push_str(&format!(
            "\n\nBağlam (çevresindeki cümle/altyazı satırı): \"{context}\""
        ));
    }

    prompt.push_str(match mode {
        ExplainMode::Translate => "\n\nLütfen yukarıdaki metni açıkladığım formatta çevir.",
        ExplainMode::Explain => {
            "\n\nLütfen bu teknik kavramı/ifadeyi açıkladığım formatta Türkçe açıkla."
        }
    });
    prompt
}

/// System message seeding a follow-up chat about a saved word.
#[must_use]
pub fn chat_system_prompt(word: &str, explanation: &str) -> String {
    format!(
        "Sen bir Türkçe teknik terimler asistanısın. Kullanıcı \"{word}\" hakkında soru soracak. \
         Mevcut açıklama:\n{explanation}\n\nKısa, net ve Türkçe cevaplar ver."
    )
}
