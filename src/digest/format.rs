//! Telegram MarkdownV2 rendering of a digest.

use crate::channels::telegram::{MAX_MESSAGE_CHARS, escape_markdown_v2};
use crate::vocabulary::VocabularyEntry;
use chrono::{Datelike, NaiveDate, Weekday};

const HEADER: &str = "📚 *Kelime — Günlük Tekrar*";
const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━";
const EXPLANATION_LINES: usize = 3;

/// Per-entry character budgets tried in order until the message fits.
/// `(explanation, word)`; `None` means unbounded.
const BUDGETS: &[(Option<usize>, Option<usize>)] = &[
    (None, None),
    (Some(600), None),
    (Some(400), None),
    (Some(250), None),
    (Some(150), None),
    (Some(80), Some(200)),
    (Some(40), Some(100)),
    (Some(0), Some(64)),
];

const MONTHS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Pazartesi",
        Weekday::Tue => "Salı",
        Weekday::Wed => "Çarşamba",
        Weekday::Thu => "Perşembe",
        Weekday::Fri => "Cuma",
        Weekday::Sat => "Cumartesi",
        Weekday::Sun => "Pazar",
    }
}

/// Turkish long date without the year, e.g. `19 Ekim Pazartesi`.
#[must_use]
pub fn today_label(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        weekday_name(date.weekday())
    )
}

/// First three non-blank lines of an explanation, without an ellipsis.
#[must_use]
pub fn short_explanation(explanation: &str) -> String {
    explanation
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(EXPLANATION_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, budget: Option<usize>) -> String {
    match budget {
        Some(max) if text.chars().count() > max => {
            if max == 0 {
                return String::new();
            }
            let mut cut: String = text.chars().take(max).collect();
            cut.push('…');
            cut
        }
        _ => text.to_owned(),
    }
}

fn render(
    selection: &[VocabularyEntry],
    total_count: usize,
    today_label: &str,
    explanation_budget: Option<usize>,
    word_budget: Option<usize>,
) -> String {
    let mut message = format!(
        "{HEADER}\n_{}_\n{SEPARATOR}\n\n",
        escape_markdown_v2(today_label)
    );

    for (i, entry) in selection.iter().enumerate() {
        let word = truncate_chars(&entry.word, word_budget);
        message.push_str(&format!("*{}\\. {}*\n", i + 1, escape_markdown_v2(&word)));

        let explanation = truncate_chars(&short_explanation(&entry.explanation), explanation_budget);
        if !explanation.is_empty() {
            message.push_str(&escape_markdown_v2(&explanation));
            message.push('\n');
        }
        message.push('\n');
    }

    message.push_str(SEPARATOR);
    message.push_str(&format!(
        "\n_{} kelime • Toplam deponda: {total_count} kelime_",
        selection.len()
    ));
    message
}

/// A rendered digest body and how many leading selection entries it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub text: String,
    pub included: usize,
}

fn render_within_budgets(
    selection: &[VocabularyEntry],
    total_count: usize,
    today_label: &str,
) -> Option<String> {
    BUDGETS
        .iter()
        .map(|&(explanation_budget, word_budget)| {
            render(
                selection,
                total_count,
                today_label,
                explanation_budget,
                word_budget,
            )
        })
        .find(|message| message.chars().count() <= MAX_MESSAGE_CHARS)
}

/// Render the digest body for `selection`.
///
/// When the body would exceed [`MAX_MESSAGE_CHARS`], explanations (and,
/// as a last resort, words) are cut to a shrinking per-entry budget before
/// escaping, so an escape sequence is never split. If even the tightest
/// budget is too long, trailing entries are dropped; `included` says how
/// many were kept and the footer count matches it.
#[must_use]
pub fn format_digest(
    selection: &[VocabularyEntry],
    total_count: usize,
    today_label: &str,
) -> DigestMessage {
    for included in (1..=selection.len()).rev() {
        if let Some(text) = render_within_budgets(&selection[..included], total_count, today_label)
        {
            return DigestMessage { text, included };
        }
    }
    DigestMessage {
        text: render(&[], total_count, today_label, Some(0), Some(64)),
        included: 0,
    }
}

/// Notice sent on a manual trigger when nothing is saved yet.
#[must_use]
pub fn format_empty_notice() -> String {
    format!(
        "📚 *Kelime*\n\n{}",
        escape_markdown_v2(
            "Henüz kayıtlı kelimen yok! Önce YouTube'da birkaç kelime açıkla ve kaydet."
        )
    )
}
