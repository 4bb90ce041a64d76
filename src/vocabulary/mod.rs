//! Saved vocabulary: entries, the bounded newest-first list, and the
//! single-writer store that persists it.

pub mod entry;
pub mod store;

pub use entry::{MAX_ENTRIES, VocabularyEntry, VocabularyList, VocabularyStats};
pub use store::{StoreEvent, VocabularyStore};
