//! Core domain types and port definitions for chatspeak.
//!
//! This crate holds everything the narration runtime needs to agree on with
//! its collaborators: chat messages, voices, the live voice configuration and
//! the ports (speech engine, ambient sound, config store) that adapters
//! implement. It has no dependency on any concrete speech or audio backend.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod message;
pub mod ports;
pub mod services;
pub mod store;
pub mod voice;

// Re-export commonly used types for convenience
pub use config::{ConfigError, VoiceConfig, VoiceConfigUpdate, validate_config};
pub use message::{ChatMessage, MessageFragment, MessageId, has_speakable_text, render_body};
pub use ports::{ConfigStore, CoreError, SoundPresence, SpeechEngine, SpeechEngineError, StoreError};
pub use services::ConfigService;
pub use store::{JsonFileConfigStore, MemoryConfigStore};
pub use voice::{Utterance, Voice};
