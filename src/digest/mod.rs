//! Daily digest: selection, formatting, delivery, and review bookkeeping.

pub mod format;
pub mod selector;

pub use format::{DigestMessage, format_digest, format_empty_notice, today_label};
pub use selector::{SelectionPolicy, select_for_digest};

use crate::channels::{Credentials, DeliveryChannel};
use crate::error::Result;
use crate::scheduler::AlarmListener;
use crate::settings::Settings;
use crate::vocabulary::VocabularyStore;
use async_trait::async_trait;
use chrono::{Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// What started a digest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestTrigger {
    /// The daily alarm fired.
    Scheduled,
    /// A user asked for a test send.
    Manual,
}

/// Published after a digest message has been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestSent {
    pub trigger: DigestTrigger,
    pub channel: &'static str,
    pub count: usize,
}

/// Composes the store, selector, formatter, and delivery channel.
#[derive(Clone)]
pub struct DigestOrchestrator {
    settings: Settings,
    store: VocabularyStore,
    channel: Arc<dyn DeliveryChannel>,
    events: broadcast::Sender<DigestSent>,
}

impl std::fmt::Debug for DigestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestOrchestrator")
            .field("channel", &self.channel.id())
            .finish_non_exhaustive()
    }
}

impl DigestOrchestrator {
    pub fn new(
        settings: Settings,
        store: VocabularyStore,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            settings,
            store,
            channel,
            events,
        }
    }

    /// Subscribe to delivered-digest notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DigestSent> {
        self.events.subscribe()
    }

    /// Run one digest. Returns how many entries were sent.
    ///
    /// Missing credentials skip delivery and return 0 without a network call.
    /// An empty selection sends the "no vocabulary yet" notice on a manual
    /// trigger only. Delivery errors propagate; entries are marked reviewed
    /// only after a successful send.
    pub async fn run(&self, trigger: DigestTrigger) -> Result<usize> {
        let config = self.settings.current();
        let Some(credentials) = Credentials::from_config(&config.telegram) else {
            info!(?trigger, "telegram credentials not set, skipping digest");
            return Ok(0);
        };

        let snapshot = self.store.list_all(None).await?;
        let policy = SelectionPolicy::from(&config.digest);
        let selection = select_for_digest(&snapshot, Utc::now(), &policy);

        if selection.is_empty() {
            if trigger == DigestTrigger::Manual {
                self.channel
                    .send(&credentials, &format_empty_notice())
                    .await?;
                info!("sent empty-vocabulary notice");
            }
            return Ok(0);
        }

        let label = today_label(Local::now().date_naive());
        let digest = format_digest(&selection, snapshot.len(), &label);
        if digest.included < selection.len() {
            warn!(
                selected = selection.len(),
                included = digest.included,
                "digest trimmed to fit one message"
            );
        }
        let sent = &selection[..digest.included];
        self.channel.send(&credentials, &digest.text).await?;

        let reviewed = self
            .store
            .mark_reviewed(sent.iter().map(|e| e.id))
            .await?;
        if reviewed < sent.len() {
            // Entries deleted between snapshot and send.
            warn!(
                sent = sent.len(),
                reviewed, "some digest entries vanished before bookkeeping"
            );
        }

        let count = sent.len();
        info!(?trigger, count, channel = self.channel.id(), "digest delivered");
        let _ = self.events.send(DigestSent {
            trigger,
            channel: self.channel.id(),
            count,
        });
        Ok(count)
    }
}

#[async_trait]
impl AlarmListener for DigestOrchestrator {
    async fn on_alarm(&self, name: &str) -> anyhow::Result<()> {
        let sent = self.run(DigestTrigger::Scheduled).await?;
        info!(alarm = name, sent, "scheduled digest finished");
        Ok(())
    }
}
