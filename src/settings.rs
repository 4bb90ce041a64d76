//! Shared, change-notifying application settings.
//!
//! A single [`Settings`] handle is cloned into every component that needs
//! configuration. Updates are validated, persisted to `config.toml`, and then
//! published on a `watch` channel so subscribers see the new value.

use crate::config::KelimeConfig;
use crate::error::{KelimeError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Cloneable handle to the current configuration.
#[derive(Clone)]
pub struct Settings {
    tx: Arc<watch::Sender<KelimeConfig>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Settings backed by a TOML file. Updates are written back to `path`.
    pub fn load(path: PathBuf) -> Result<Self> {
        let config = KelimeConfig::load_or_default(&path)?;
        debug!("loaded settings from {}", path.display());
        Ok(Self::with_config(config, Some(path)))
    }

    /// Settings that live only in memory.
    #[must_use]
    pub fn in_memory(config: KelimeConfig) -> Self {
        Self::with_config(config, None)
    }

    fn with_config(config: KelimeConfig, path: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self {
            tx: Arc::new(tx),
            path,
        }
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn current(&self) -> KelimeConfig {
        self.tx.borrow().clone()
    }

    /// Apply `change` to a copy of the current config, validate, persist, publish.
    ///
    /// On validation or write failure the published config is left unchanged.
    pub fn update<F>(&self, change: F) -> Result<KelimeConfig>
    where
        F: FnOnce(&mut KelimeConfig),
    {
        self.try_update(|config| {
            change(config);
            Ok(())
        })
        .map(|(_, next)| next)
    }

    /// Like [`update`](Self::update), but `change` may fail. Returns the
    /// config before and after the change.
    ///
    /// The change runs against the live value while the watch channel is
    /// write-locked, so concurrent updates apply one after another.
    pub fn try_update<F>(&self, change: F) -> Result<(KelimeConfig, KelimeConfig)>
    where
        F: FnOnce(&mut KelimeConfig) -> Result<()>,
    {
        let mut outcome = None;
        self.tx.send_if_modified(|current| {
            let result = commit(self.path.as_deref(), current, change);
            let modified = result.is_ok();
            outcome = Some(result);
            modified
        });

        let (previous, next) = outcome.unwrap_or_else(|| {
            Err(KelimeError::Config("settings update was not applied".to_owned()))
        })?;
        info!("settings updated");
        Ok((previous, next))
    }

    /// Subscribe to configuration changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<KelimeConfig> {
        self.tx.subscribe()
    }
}

fn commit<F>(
    path: Option<&Path>,
    current: &mut KelimeConfig,
    change: F,
) -> Result<(KelimeConfig, KelimeConfig)>
where
    F: FnOnce(&mut KelimeConfig) -> Result<()>,
{
    let mut next = current.clone();
    change(&mut next)?;
    next.validate()?;
    if let Some(path) = path {
        next.save_to_file(path)?;
    }
    let previous = std::mem::replace(current, next.clone());
    Ok((previous, next))
}
