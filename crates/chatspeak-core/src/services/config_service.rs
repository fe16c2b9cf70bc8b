//! Config service - the single writer of the live voice configuration.
//!
//! The live [`VoiceConfig`] is held in a `tokio::sync::watch` cell. Readers
//! (narrator, chat feed) hold receivers obtained from [`ConfigService::subscribe`];
//! only this service ever sends into the cell.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{VoiceConfig, VoiceConfigUpdate, validate_config};
use crate::ports::{ConfigStore, CoreError};

/// Service for voice configuration operations.
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    live: watch::Sender<VoiceConfig>,
}

impl ConfigService {
    /// Load the stored config and publish it as the initial live value.
    pub async fn load(store: Arc<dyn ConfigStore>) -> Result<Self, CoreError> {
        let config = store.load().await?;
        validate_config(&config)?;
        log_config("Loaded voice config", &config);

        let (live, _) = watch::channel(config);
        Ok(Self { store, live })
    }

    /// Like [`load`](Self::load), but falls back to defaults when the store
    /// cannot be read or holds an invalid config.
    pub async fn load_or_default(store: Arc<dyn ConfigStore>) -> Self {
        let config = match store.load().await {
            Ok(config) => match validate_config(&config) {
                Ok(()) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored voice config is invalid, using defaults");
                    VoiceConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load voice config, using defaults");
                VoiceConfig::default()
            }
        };
        log_config("Loaded voice config", &config);

        let (live, _) = watch::channel(config);
        Self { store, live }
    }

    /// Obtain a read-only view of the live config.
    pub fn subscribe(&self) -> watch::Receiver<VoiceConfig> {
        self.live.subscribe()
    }

    /// Snapshot of the current live config.
    pub fn current(&self) -> VoiceConfig {
        self.live.borrow().clone()
    }

    /// Apply a user-initiated change: merge, validate, persist, then publish.
    ///
    /// Nothing is published if validation or persistence fails.
    pub async fn update(&self, update: VoiceConfigUpdate) -> Result<VoiceConfig, CoreError> {
        let mut next = self.current();
        next.merge(&update);
        validate_config(&next)?;
        self.store.save(&next).await?;

        self.live.send_replace(next.clone());
        log_config("Voice config changed", &next);
        Ok(next)
    }

    /// Apply a change notification that originated in the store itself
    /// (e.g. another surface edited the preferences). Already persisted, so
    /// it is only validated and published.
    pub fn apply_external_change(
        &self,
        update: &VoiceConfigUpdate,
    ) -> Result<VoiceConfig, CoreError> {
        let mut next = self.current();
        next.merge(update);
        validate_config(&next)?;

        self.live.send_replace(next.clone());
        log_config("Voice config changed externally", &next);
        Ok(next)
    }
}

fn log_config(message: &'static str, config: &VoiceConfig) {
    tracing::info!(
        voice = %config.voice_type,
        emojis = config.emojis_enabled,
        rate = config.rate,
        pitch = config.pitch,
        volume = config.volume,
        delay = config.delay,
        "{message}"
    );
}
