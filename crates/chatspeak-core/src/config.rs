//! Voice configuration domain types and validation.
//!
//! [`VoiceConfig`] mirrors the keys of the external preference store
//! (`voiceType`, `emojisEnabled`, `voiceRate`, `voicePitch`, `voiceVolume`,
//! `delay`). Missing keys fall back to the defaults, so a partially written
//! store still deserializes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lowest accepted speaking rate.
pub const MIN_RATE: f32 = 0.1;
/// Highest accepted speaking rate.
pub const MAX_RATE: f32 = 10.0;
/// Highest accepted pitch.
pub const MAX_PITCH: f32 = 2.0;
/// Longest accepted gap between messages, in seconds.
pub const MAX_DELAY_SECS: f32 = 3600.0;
/// [`MAX_DELAY_SECS`] as a [`Duration`].
pub const MAX_DELAY: Duration = Duration::from_secs(3600);

/// Live voice settings shared by the narrator and the speech driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Configured voice identifier (voice URI, or a language tag for older
    /// configurations). Empty means "engine default".
    #[serde(rename = "voiceType")]
    pub voice_type: String,

    /// Whether emoji alt text is spoken.
    #[serde(rename = "emojisEnabled")]
    pub emojis_enabled: bool,

    /// Speaking rate multiplier.
    #[serde(rename = "voiceRate")]
    pub rate: f32,

    /// Pitch multiplier.
    #[serde(rename = "voicePitch")]
    pub pitch: f32,

    /// Output volume (0.0–1.0).
    #[serde(rename = "voiceVolume")]
    pub volume: f32,

    /// Gap between consecutive messages, in seconds.
    pub delay: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_type: String::new(),
            emojis_enabled: true,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            delay: 0.0,
        }
    }
}

impl VoiceConfig {
    /// The inter-message delay as a [`Duration`].
    ///
    /// Negative or NaN values collapse to zero; anything longer than
    /// [`MAX_DELAY`] is capped.
    #[must_use]
    pub fn delay_duration(&self) -> Duration {
        if self.delay.is_nan() || self.delay <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f32(self.delay)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }

    /// Merge a partial update into this config, only touching fields that are `Some`.
    pub fn merge(&mut self, update: &VoiceConfigUpdate) {
        if let Some(ref voice_type) = update.voice_type {
            self.voice_type.clone_from(voice_type);
        }
        if let Some(emojis) = update.emojis_enabled {
            self.emojis_enabled = emojis;
        }
        if let Some(rate) = update.rate {
            self.rate = rate;
        }
        if let Some(pitch) = update.pitch {
            self.pitch = pitch;
        }
        if let Some(volume) = update.volume {
            self.volume = volume;
        }
        if let Some(delay) = update.delay {
            self.delay = delay;
        }
    }
}

/// Partial voice config update, as delivered by a store change notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VoiceConfigUpdate {
    #[serde(rename = "voiceType", skip_serializing_if = "Option::is_none")]
    pub voice_type: Option<String>,
    #[serde(rename = "emojisEnabled", skip_serializing_if = "Option::is_none")]
    pub emojis_enabled: Option<bool>,
    #[serde(rename = "voiceRate", skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    #[serde(rename = "voicePitch", skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(rename = "voiceVolume", skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f32>,
}

/// Voice config validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Voice rate must be between {MIN_RATE} and {MAX_RATE}, got {0}")]
    InvalidRate(f32),

    #[error("Voice pitch must be between 0 and {MAX_PITCH}, got {0}")]
    InvalidPitch(f32),

    #[error("Voice volume must be between 0 and 1, got {0}")]
    InvalidVolume(f32),

    #[error("Delay must be between 0 and {MAX_DELAY_SECS} seconds, got {0}")]
    InvalidDelay(f32),
}

/// Validate a voice config.
pub fn validate_config(config: &VoiceConfig) -> Result<(), ConfigError> {
    if !(MIN_RATE..=MAX_RATE).contains(&config.rate) {
        return Err(ConfigError::InvalidRate(config.rate));
    }
    if !(0.0..=MAX_PITCH).contains(&config.pitch) {
        return Err(ConfigError::InvalidPitch(config.pitch));
    }
    if !(0.0..=1.0).contains(&config.volume) {
        return Err(ConfigError::InvalidVolume(config.volume));
    }
    if !(0.0..=MAX_DELAY_SECS).contains(&config.delay) {
        return Err(ConfigError::InvalidDelay(config.delay));
    }
    Ok(())
}
