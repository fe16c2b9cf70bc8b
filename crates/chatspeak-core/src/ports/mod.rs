//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the narration core expects from its
//! collaborators: the speech engine, the ambient sound source and the
//! preference store. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - Engine state is queried through the port, never assumed
//! - All traits are object-safe so adapters can be injected as `Arc<dyn _>`
//! - No storage or audio backend types in any signature

pub mod config_store;
pub mod sound;
pub mod speech_engine;

use thiserror::Error;

pub use config_store::ConfigStore;
pub use sound::SoundPresence;
pub use speech_engine::{SpeechEngine, SpeechEngineError};

/// Domain-specific errors for configuration store operations.
///
/// Abstracts away the storage backend so services can handle failures
/// uniformly.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error (filesystem, browser storage bridge, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Core error type for configuration operations.
///
/// Adapters map this to their own error surfaces.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Config validation error.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
