//! Single-writer vocabulary store.
//!
//! One task owns the [`VocabularyList`] and applies commands from an mpsc
//! queue in arrival order. Each mutation is persisted (temp file + rename)
//! before it becomes visible, and callers get their reply on a oneshot.

use super::entry::{VocabularyEntry, VocabularyList, VocabularyStats};
use crate::error::{KelimeError, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

const COMMAND_QUEUE_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 64;

/// Change notification published after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    Inserted { id: u64, word: String },
    Deleted { id: u64 },
    Cleared,
    Reviewed { ids: Vec<u64> },
}

enum StoreCommand {
    Insert {
        word: String,
        explanation: String,
        context: String,
        reply: oneshot::Sender<Result<Option<VocabularyEntry>>>,
    },
    List {
        filter: Option<String>,
        reply: oneshot::Sender<Vec<VocabularyEntry>>,
    },
    Delete {
        id: u64,
        reply: oneshot::Sender<Result<bool>>,
    },
    Clear {
        reply: oneshot::Sender<Result<()>>,
    },
    MarkReviewed {
        ids: HashSet<u64>,
        reply: oneshot::Sender<Result<usize>>,
    },
}

/// Cloneable handle to the vocabulary store task.
#[derive(Debug, Clone)]
pub struct VocabularyStore {
    tx: mpsc::Sender<StoreCommand>,
    events: broadcast::Sender<StoreEvent>,
}

impl std::fmt::Debug for StoreCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Insert { .. } => "Insert",
            Self::List { .. } => "List",
            Self::Delete { .. } => "Delete",
            Self::Clear { .. } => "Clear",
            Self::MarkReviewed { .. } => "MarkReviewed",
        };
        f.write_str(name)
    }
}

impl VocabularyStore {
    /// Open the store backed by `path`, spawning its writer task.
    ///
    /// A missing file is an empty store. A file that does not parse is a
    /// [`KelimeError::Parse`]; it is never silently replaced.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        info!(path = %path.display(), entries = entries.len(), "vocabulary store opened");
        Ok(Self::spawn(VocabularyList::from_entries(entries), Some(path)))
    }

    /// Store with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::spawn(VocabularyList::default(), None)
    }

    /// In-memory store seeded with `entries` (store order, newest first).
    #[must_use]
    pub fn with_entries(entries: Vec<VocabularyEntry>) -> Self {
        Self::spawn(VocabularyList::from_entries(entries), None)
    }

    fn spawn(list: VocabularyList, path: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let writer = StoreWriter {
            list,
            path,
            events: events.clone(),
        };
        tokio::spawn(writer.run(rx));
        Self { tx, events }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> StoreCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| KelimeError::Store("vocabulary writer stopped".to_owned()))?;
        rx.await
            .map_err(|_| KelimeError::Store("vocabulary writer dropped reply".to_owned()))
    }

    /// Save a new word. Returns `false` when a case-insensitive duplicate exists.
    pub async fn insert(&self, word: &str, explanation: &str, context: &str) -> Result<bool> {
        let word = word.trim();
        if word.is_empty() {
            return Err(KelimeError::Validation("word is empty".to_owned()));
        }
        let inserted = self
            .request(|reply| StoreCommand::Insert {
                word: word.to_owned(),
                explanation: explanation.to_owned(),
                context: context.to_owned(),
                reply,
            })
            .await??;
        Ok(inserted.is_some())
    }

    /// Snapshot of entries, optionally filtered by case-insensitive substring.
    pub async fn list_all(&self, filter: Option<&str>) -> Result<Vec<VocabularyEntry>> {
        self.request(|reply| StoreCommand::List {
            filter: filter.map(str::to_owned),
            reply,
        })
        .await
    }

    /// Remove the entry with `id`. Returns `false` when nothing matched.
    pub async fn delete(&self, id: u64) -> Result<bool> {
        self.request(|reply| StoreCommand::Delete { id, reply })
            .await?
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<()> {
        self.request(|reply| StoreCommand::Clear { reply }).await?
    }

    /// Increment the review counter of every entry whose id is in `ids`.
    pub async fn mark_reviewed(&self, ids: impl IntoIterator<Item = u64>) -> Result<usize> {
        let ids: HashSet<u64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(0);
        }
        self.request(|reply| StoreCommand::MarkReviewed { ids, reply })
            .await?
    }

    /// Saved-word counters relative to `now`.
    pub async fn stats(&self, now: DateTime<Local>) -> Result<VocabularyStats> {
        let entries = self.list_all(None).await?;
        Ok(VocabularyStats::compute(&entries, now))
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

fn read_entries(path: &Path) -> Result<Vec<VocabularyEntry>> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
            KelimeError::Parse(format!("vocabulary file {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write_entries(path: &Path, entries: &[VocabularyEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(entries)
        .map_err(|e| KelimeError::Store(format!("serialize vocabulary: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

struct StoreWriter {
    list: VocabularyList,
    path: Option<PathBuf>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreWriter {
    async fn run(mut self, mut rx: mpsc::Receiver<StoreCommand>) {
        while let Some(cmd) = rx.recv().await {
            debug!(command = ?cmd, "vocabulary command");
            self.handle(cmd).await;
        }
        debug!("vocabulary writer stopped");
    }

    async fn handle(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::Insert {
                word,
                explanation,
                context,
                reply,
            } => {
                let now = Utc::now();
                let result = self
                    .commit(|list| list.insert(&word, &explanation, &context, now))
                    .await;
                if let Ok(Some(entry)) = &result {
                    self.publish(StoreEvent::Inserted {
                        id: entry.id,
                        word: entry.word.clone(),
                    });
                }
                let _ = reply.send(result);
            }
            StoreCommand::List { filter, reply } => {
                let _ = reply.send(self.list.filtered(filter.as_deref()));
            }
            StoreCommand::Delete { id, reply } => {
                let result = self.commit(|list| list.delete(id)).await;
                if matches!(result, Ok(true)) {
                    self.publish(StoreEvent::Deleted { id });
                }
                let _ = reply.send(result);
            }
            StoreCommand::Clear { reply } => {
                let result = self
                    .commit(|list| {
                        let had_entries = !list.is_empty();
                        list.clear();
                        had_entries
                    })
                    .await;
                if result.is_ok() {
                    self.publish(StoreEvent::Cleared);
                }
                let _ = reply.send(result.map(|_| ()));
            }
            StoreCommand::MarkReviewed { ids, reply } => {
                let now = Utc::now();
                let result = self.commit(|list| list.mark_reviewed(&ids, now)).await;
                if matches!(result, Ok(n) if n > 0) {
                    let mut ids: Vec<u64> = ids.into_iter().collect();
                    ids.sort_unstable();
                    self.publish(StoreEvent::Reviewed { ids });
                }
                let _ = reply.send(result);
            }
        }
    }

    /// Apply `change` to a copy of the list, persist it, then swap it in.
    ///
    /// The change is skipped from persistence when it reports no effect
    /// (`None`, `false`, or `0`).
    async fn commit<T: Changed>(
        &mut self,
        change: impl FnOnce(&mut VocabularyList) -> T,
    ) -> Result<T> {
        let mut next = self.list.clone();
        let outcome = change(&mut next);
        if !outcome.changed() {
            return Ok(outcome);
        }
        if let Some(path) = &self.path
            && let Err(e) = write_entries(path, next.entries()).await
        {
            warn!(error = %e, "failed to persist vocabulary");
            return Err(e);
        }
        self.list = next;
        Ok(outcome)
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

trait Changed {
    fn changed(&self) -> bool;
}

impl Changed for bool {
    fn changed(&self) -> bool {
        *self
    }
}

impl Changed for usize {
    fn changed(&self) -> bool {
        *self > 0
    }
}

impl<T> Changed for Option<T> {
    fn changed(&self) -> bool {
        self.is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::vocabulary::entry::MAX_ENTRIES;

    #[tokio::test]
    async fn insert_then_list() {
        let store = VocabularyStore::in_memory();
        assert!(store.insert("borrow checker", "ödünç denetleyici", "").await.unwrap());
        assert!(!store.insert("Borrow Checker", "dup", "").await.unwrap());

        let all = store.list_all(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].explanation, "ödünç denetleyici");
    }

    #[tokio::test]
    async fn blank_word_is_validation_error() {
        let store = VocabularyStore::in_memory();
        let err = store.insert("   ", "x", "").await.unwrap_err();
        assert!(matches!(err, KelimeError::Validation(_)));
    }

    #[tokio::test]
    async fn concurrent_mark_reviewed_both_count() {
        let store = VocabularyStore::in_memory();
        store.insert("a", "", "").await.unwrap();
        let id = store.list_all(None).await.unwrap()[0].id;

        let (first, second) = tokio::join!(store.mark_reviewed([id]), store.mark_reviewed([id]));
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);

        let entry = &store.list_all(None).await.unwrap()[0];
        assert_eq!(entry.review_count, 2);
    }

    #[tokio::test]
    async fn mark_reviewed_stamps_at_or_after_call() {
        let store = VocabularyStore::in_memory();
        store.insert("a", "", "").await.unwrap();
        store.insert("b", "", "").await.unwrap();
        store.insert("c", "", "").await.unwrap();
        let all = store.list_all(None).await.unwrap();
        let picked = [all[0].id, all[2].id];

        let before = Utc::now();
        assert_eq!(store.mark_reviewed(picked).await.unwrap(), 2);

        for entry in store.list_all(None).await.unwrap() {
            if picked.contains(&entry.id) {
                assert_eq!(entry.review_count, 1);
                assert!(entry.last_reviewed.unwrap() >= before);
            } else {
                assert_eq!(entry.review_count, 0);
                assert!(entry.last_reviewed.is_none());
            }
        }
    }

    #[tokio::test]
    async fn reopen_from_disk_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");

        {
            let store = VocabularyStore::open(&path).unwrap();
            store.insert("ownership", "sahiplik", "Rust ownership rules").await.unwrap();
            store.insert("lifetime", "ömür", "").await.unwrap();
        }

        let reopened = VocabularyStore::open(&path).unwrap();
        let words: Vec<_> = reopened
            .list_all(None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.word)
            .collect();
        assert_eq!(words, vec!["lifetime", "ownership"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = VocabularyStore::open(&path).unwrap_err();
        assert!(matches!(err, KelimeError::Parse(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabularyStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.list_all(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_seed_is_trimmed() {
        let mut list = VocabularyList::default();
        for i in 0..MAX_ENTRIES {
            list.insert(&format!("w{i}"), "", "", Utc::now());
        }
        let mut entries = list.into_entries();
        entries.push(VocabularyEntry {
            id: 1,
            word: "extra".to_owned(),
            explanation: String::new(),
            context: String::new(),
            saved_at: Utc::now(),
            review_count: 0,
            last_reviewed: None,
        });

        let store = VocabularyStore::with_entries(entries);
        assert_eq!(store.list_all(None).await.unwrap().len(), MAX_ENTRIES);
    }

    #[tokio::test]
    async fn events_follow_mutations() {
        let store = VocabularyStore::in_memory();
        let mut events = store.subscribe();

        store.insert("trait", "özellik", "").await.unwrap();
        let id = match events.recv().await.unwrap() {
            StoreEvent::Inserted { id, word } => {
                assert_eq!(word, "trait");
                id
            }
            other => panic!("unexpected event {other:?}"),
        };

        store.mark_reviewed([id]).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Reviewed { ids: vec![id] }
        );

        assert!(store.delete(id).await.unwrap());
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Deleted { id });

        store.clear().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Cleared);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_no_op() {
        let store = VocabularyStore::in_memory();
        store.insert("a", "", "").await.unwrap();
        assert!(!store.delete(42).await.unwrap());
        assert_eq!(store.list_all(None).await.unwrap().len(), 1);
    }
}
