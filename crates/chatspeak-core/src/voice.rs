//! Speech voice descriptors.

use serde::{Deserialize, Serialize};

/// A voice offered by the speech engine.
///
/// Voices are immutable engine resources; the narrator only ever clones them
/// into utterances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    /// Engine-assigned unique identifier (e.g. a voice URI).
    pub uri: String,

    /// Human-readable display name.
    pub name: String,

    /// BCP 47 language tag (e.g. `"en-US"`).
    pub lang: String,

    /// Whether synthesis happens locally rather than through a remote service.
    pub local_service: bool,
}

impl Voice {
    /// Convenience constructor for a local voice.
    pub fn new(uri: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            lang: lang.into(),
            local_service: true,
        }
    }

    /// Whether this voice answers to a configured voice identifier.
    ///
    /// Older configurations stored a language tag instead of a voice URI, so
    /// both fields are accepted.
    #[must_use]
    pub fn matches(&self, configured_id: &str) -> bool {
        self.uri == configured_id || self.lang == configured_id
    }
}

/// A single utterance request handed to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to speak.
    pub text: String,
    /// Voice to speak it with.
    pub voice: Voice,
    /// Speaking rate multiplier.
    pub rate: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Output volume (0.0–1.0).
    pub volume: f32,
}
