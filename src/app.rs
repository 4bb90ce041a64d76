//! Application wiring: one place that builds every component and shares it.

use crate::channels::{DeliveryChannel, TelegramChannel};
use crate::digest::DigestOrchestrator;
use crate::error::Result;
use crate::kelime_dirs;
use crate::llm::{CompletionClient, OpenAiClient};
use crate::scheduler::AlarmScheduler;
use crate::settings::Settings;
use crate::transcript::TranscriptClient;
use crate::vocabulary::VocabularyStore;
use std::sync::Arc;
use tracing::info;

/// Shared handles to every long-lived component.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: VocabularyStore,
    pub llm: Arc<dyn CompletionClient>,
    pub channel: Arc<dyn DeliveryChannel>,
    pub digest: DigestOrchestrator,
    pub scheduler: AlarmScheduler,
    pub transcripts: TranscriptClient,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("channel", &self.channel.id())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state from explicit components. The digest orchestrator is
    /// wired as the daily alarm listener.
    pub fn new(
        settings: Settings,
        store: VocabularyStore,
        llm: Arc<dyn CompletionClient>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        let digest = DigestOrchestrator::new(settings.clone(), store.clone(), Arc::clone(&channel));
        let scheduler = AlarmScheduler::new(settings.clone(), Arc::new(digest.clone()));
        let transcripts = TranscriptClient::new(settings.clone());
        Self {
            settings,
            store,
            llm,
            channel,
            digest,
            scheduler,
            transcripts,
        }
    }

    /// Load settings and the vocabulary store from the standard locations
    /// and connect the real OpenAI and Telegram clients.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bootstrap() -> Result<Self> {
        let config_path = kelime_dirs::config_file();
        let store_path = kelime_dirs::vocabulary_file();
        info!(
            config = %config_path.display(),
            store = %store_path.display(),
            "bootstrapping kelime"
        );

        let settings = Settings::load(config_path)?;
        settings.current().validate()?;
        let store = VocabularyStore::open(store_path)?;
        let llm: Arc<dyn CompletionClient> = Arc::new(OpenAiClient::new(settings.clone()));
        let channel: Arc<dyn DeliveryChannel> = Arc::new(TelegramChannel::new(settings.clone()));
        Ok(Self::new(settings, store, llm, channel))
    }
}
