//! Voice configuration store trait definition.
//!
//! This port defines the interface for persisting voice preferences.
//! Implementations handle all storage details internally.

use async_trait::async_trait;

use super::StoreError;
use crate::config::VoiceConfig;

/// Store for voice configuration persistence.
///
/// # Design Rules
///
/// - Works with the domain `VoiceConfig` type directly
/// - Implementation handles serialization internally
/// - `load` returns defaults when nothing has been stored yet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored voice configuration.
    async fn load(&self) -> Result<VoiceConfig, StoreError>;

    /// Save the voice configuration.
    async fn save(&self, config: &VoiceConfig) -> Result<(), StoreError>;
}
