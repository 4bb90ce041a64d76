//! Which saved words go into the next digest.

use crate::config::DigestConfig;
use crate::vocabulary::VocabularyEntry;
use chrono::{DateTime, Duration, Utc};

/// Item count and freshness window for digest selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Maximum entries per digest.
    pub max_items: usize,
    /// Entries reviewed more recently than this are not eligible.
    pub freshness: Duration,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_items: 5,
            freshness: Duration::days(3),
        }
    }
}

impl From<&DigestConfig> for SelectionPolicy {
    fn from(config: &DigestConfig) -> Self {
        Self {
            max_items: config.max_items,
            freshness: Duration::try_days(config.freshness_days).unwrap_or(Duration::MAX),
        }
    }
}

/// Choose up to `policy.max_items` entries from a store-order snapshot.
///
/// Entries never reviewed, or last reviewed before `now - freshness`, are
/// eligible. When enough are eligible they are taken in store order (newest
/// first). Otherwise the whole snapshot is stable-sorted by `last_reviewed`
/// ascending, never-reviewed first, and the head is taken.
#[must_use]
pub fn select_for_digest(
    entries: &[VocabularyEntry],
    now: DateTime<Utc>,
    policy: &SelectionPolicy,
) -> Vec<VocabularyEntry> {
    if entries.is_empty() || policy.max_items == 0 {
        return Vec::new();
    }

    // A window reaching past the earliest representable time makes nothing eligible.
    let cutoff = now
        .checked_sub_signed(policy.freshness)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let eligible: Vec<&VocabularyEntry> = entries
        .iter()
        .filter(|e| e.last_reviewed.is_none_or(|at| at < cutoff))
        .collect();

    let pool = if eligible.len() >= policy.max_items {
        eligible
    } else {
        let mut all: Vec<&VocabularyEntry> = entries.iter().collect();
        // `None < Some(_)`, so never-reviewed entries sort first.
        all.sort_by_key(|e| e.last_reviewed);
        all
    };

    pool.into_iter()
        .take(policy.max_items)
        .cloned()
        .collect()
}
