//! Vocabulary entry types and the in-memory list they live in.
//!
//! [`VocabularyList`] holds the pure list semantics (dedup, newest-first
//! ordering, capacity eviction, review bookkeeping). Persistence and
//! serialization of writers live in [`super::store`].

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of entries kept in the store.
pub const MAX_ENTRIES: usize = 500;

/// A saved word with its explanation and review metadata.
///
/// Field names serialize in camelCase to stay compatible with the
/// extension's `vocabulary` storage export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    /// Creation-time derived unique id (epoch milliseconds).
    pub id: u64,
    /// The selected word or phrase.
    pub word: String,
    /// LLM explanation, possibly multi-line with inline markup.
    pub explanation: String,
    /// Surrounding sentence or caption line; empty when unavailable.
    #[serde(default)]
    pub context: String,
    /// When the entry was saved.
    pub saved_at: DateTime<Utc>,
    /// How many digests have included this entry.
    #[serde(default)]
    pub review_count: u32,
    /// When the entry was last included in a digest.
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl VocabularyEntry {
    /// Case-insensitive word comparison used for dedup and filtering.
    #[must_use]
    pub fn word_key(&self) -> String {
        self.word.to_lowercase()
    }
}

/// Saved-word counters shown in the side panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyStats {
    /// Entries in the store.
    pub total: usize,
    /// Entries saved within the last 7 days.
    pub saved_this_week: usize,
    /// Entries saved on the current local calendar day.
    pub saved_today: usize,
}

impl VocabularyStats {
    /// Compute counters for `entries` relative to `now`.
    #[must_use]
    pub fn compute(entries: &[VocabularyEntry], now: DateTime<Local>) -> Self {
        let week_ago = now.with_timezone(&Utc) - Duration::days(7);
        let today = now.date_naive();
        Self {
            total: entries.len(),
            saved_this_week: entries.iter().filter(|e| e.saved_at >= week_ago).count(),
            saved_today: entries
                .iter()
                .filter(|e| e.saved_at.with_timezone(&Local).date_naive() == today)
                .count(),
        }
    }
}

/// Ordered vocabulary list, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyList {
    entries: Vec<VocabularyEntry>,
}

impl VocabularyList {
    /// Wrap existing entries, trimming to [`MAX_ENTRIES`] from the tail.
    #[must_use]
    pub fn from_entries(mut entries: Vec<VocabularyEntry>) -> Self {
        entries.truncate(MAX_ENTRIES);
        Self { entries }
    }

    /// Entries in store order.
    #[must_use]
    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a word is already saved (case-insensitive).
    #[must_use]
    pub fn contains_word(&self, word: &str) -> bool {
        let key = word.to_lowercase();
        self.entries.iter().any(|e| e.word_key() == key)
    }

    fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let candidate = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        match self.entries.iter().map(|e| e.id).max() {
            Some(max) if max >= candidate => max + 1,
            _ => candidate,
        }
    }

    /// Prepend a new entry unless the word already exists.
    ///
    /// Returns the inserted entry, or `None` for a case-insensitive duplicate.
    /// Evicts the oldest entry when the list grows past [`MAX_ENTRIES`].
    pub fn insert(
        &mut self,
        word: &str,
        explanation: &str,
        context: &str,
        now: DateTime<Utc>,
    ) -> Option<VocabularyEntry> {
        if self.contains_word(word) {
            return None;
        }

        let entry = VocabularyEntry {
            id: self.next_id(now),
            word: word.to_owned(),
            explanation: explanation.to_owned(),
            context: context.to_owned(),
            saved_at: now,
            review_count: 0,
            last_reviewed: None,
        };
        self.entries.insert(0, entry.clone());

        if self.entries.len() > MAX_ENTRIES {
            self.entries.pop();
        }
        Some(entry)
    }

    /// Entries whose word contains `filter` (case-insensitive), in store order.
    #[must_use]
    pub fn filtered(&self, filter: Option<&str>) -> Vec<VocabularyEntry> {
        match filter.map(str::trim).filter(|f| !f.is_empty()) {
            None => self.entries.clone(),
            Some(f) => {
                let needle = f.to_lowercase();
                self.entries
                    .iter()
                    .filter(|e| e.word_key().contains(&needle))
                    .cloned()
                    .collect()
            }
        }
    }

    /// Remove the entry with `id`. Returns `true` when something was removed.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Increment `review_count` and stamp `last_reviewed` for each id in `ids`.
    ///
    /// Returns how many entries were updated.
    pub fn mark_reviewed(&mut self, ids: &HashSet<u64>, now: DateTime<Utc>) -> usize {
        let mut updated = 0;
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
            entry.review_count = entry.review_count.saturating_add(1);
            entry.last_reviewed = Some(now);
            updated += 1;
        }
        updated
    }

    /// Consume the list and return its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<VocabularyEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn insert_prepends_newest_first() {
        let mut list = VocabularyList::default();
        list.insert("latency", "gecikme", "", t0()).unwrap();
        list.insert("throughput", "verim", "", t0() + Duration::seconds(1))
            .unwrap();

        let words: Vec<_> = list.entries().iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["throughput", "latency"]);
        assert_eq!(list.entries()[0].review_count, 0);
        assert!(list.entries()[0].last_reviewed.is_none());
    }

    #[test]
    fn case_only_duplicate_is_a_no_op() {
        let mut list = VocabularyList::default();
        list.insert("Kubernetes", "orkestrasyon", "ctx", t0()).unwrap();
        let before = list.clone();

        assert!(list.insert("kUBERNETES", "other", "", t0()).is_none());
        assert_eq!(list, before);
    }

    #[test]
    fn insert_past_capacity_evicts_oldest() {
        let mut list = VocabularyList::default();
        for i in 0..MAX_ENTRIES {
            list.insert(&format!("word{i}"), "x", "", t0() + Duration::seconds(i as i64))
                .unwrap();
        }
        assert_eq!(list.len(), MAX_ENTRIES);
        assert_eq!(list.entries().last().unwrap().word, "word0");

        list.insert("newest", "x", "", t0() + Duration::days(1)).unwrap();
        assert_eq!(list.len(), MAX_ENTRIES);
        assert_eq!(list.entries()[0].word, "newest");
        assert!(!list.contains_word("word0"));
        assert_eq!(list.entries().last().unwrap().word, "word1");
    }

    #[test]
    fn ids_are_unique_within_the_same_millisecond() {
        let mut list = VocabularyList::default();
        let a = list.insert("a", "", "", t0()).unwrap();
        let b = list.insert("b", "", "", t0()).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut list = VocabularyList::default();
        list.insert("Docker Compose", "", "", t0()).unwrap();
        list.insert("compiler", "", "", t0()).unwrap();
        list.insert("cache", "", "", t0()).unwrap();

        let hits: Vec<_> = list
            .filtered(Some("COMP"))
            .into_iter()
            .map(|e| e.word)
            .collect();
        assert_eq!(hits, vec!["compiler", "Docker Compose"]);
        assert_eq!(list.filtered(Some("  ")).len(), 3);
        assert_eq!(list.filtered(None).len(), 3);
    }

    #[test]
    fn delete_and_clear() {
        let mut list = VocabularyList::default();
        let a = list.insert("a", "", "", t0()).unwrap();
        list.insert("b", "", "", t0()).unwrap();

        assert!(list.delete(a.id));
        assert!(!list.delete(a.id));
        assert_eq!(list.len(), 1);

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn mark_reviewed_touches_only_given_ids() {
        let mut list = VocabularyList::default();
        let a = list.insert("a", "", "", t0()).unwrap();
        let b = list.insert("b", "", "", t0()).unwrap();
        let c = list.insert("c", "", "", t0()).unwrap();

        let later = t0() + Duration::hours(5);
        let ids: HashSet<u64> = [a.id, b.id].into_iter().collect();
        assert_eq!(list.mark_reviewed(&ids, later), 2);

        for entry in list.entries() {
            if entry.id == c.id {
                assert_eq!(entry.review_count, 0);
                assert!(entry.last_reviewed.is_none());
            } else {
                assert_eq!(entry.review_count, 1);
                assert_eq!(entry.last_reviewed, Some(later));
            }
        }
    }

    #[test]
    fn entry_json_uses_extension_field_names() {
        let mut list = VocabularyList::default();
        let entry = list.insert("a", "b", "c", t0()).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("savedAt").is_some());
        assert_eq!(json["reviewCount"], 0);
        assert!(json["lastReviewed"].is_null());
    }

    #[test]
    fn entry_parses_extension_export_with_missing_fields() {
        let raw = r#"{"id":1710000000000,"word":"mutex","explanation":"kilit","savedAt":"2024-03-09T16:00:00.000Z"}"#;
        let entry: VocabularyEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.context, "");
        assert_eq!(entry.review_count, 0);
        assert!(entry.last_reviewed.is_none());
    }

    #[test]
    fn stats_count_today_and_week() {
        let now = Local::now();
        let now_utc = now.with_timezone(&Utc);
        let mut list = VocabularyList::default();
        list.insert("old", "", "", now_utc - Duration::days(30)).unwrap();
        list.insert("recent", "", "", now_utc - Duration::days(3)).unwrap();
        list.insert("fresh", "", "", now_utc).unwrap();

        let stats = VocabularyStats::compute(list.entries(), now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.saved_this_week, 2);
        assert_eq!(stats.saved_today, 1);
    }
}
