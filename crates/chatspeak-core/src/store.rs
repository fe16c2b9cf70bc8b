//! Config store adapters.
//!
//! - [`JsonFileConfigStore`] persists the voice config as a JSON document.
//! - [`MemoryConfigStore`] keeps it in process memory; used when no durable
//!   store is available and in tests.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::config::VoiceConfig;
use crate::ports::{ConfigStore, StoreError};

/// Voice config persisted as a JSON file.
///
/// A missing file is not an error: it yields the default config, matching a
/// key-value store that has never been written.
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    async fn load(&self) -> Result<VoiceConfig, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.path.display(),
                    "No stored voice config, using defaults"
                );
                Ok(VoiceConfig::default())
            }
            Err(e) => Err(StoreError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, config: &VoiceConfig) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }

        tokio::fs::write(&self.path, json).await.map_err(|e| {
            StoreError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

/// In-memory voice config store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: Mutex<VoiceConfig>,
}

impl MemoryConfigStore {
    /// Create a store pre-populated with `config`.
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<VoiceConfig, StoreError> {
        Ok(self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save(&self, config: &VoiceConfig) -> Result<(), StoreError> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        Ok(())
    }
}
