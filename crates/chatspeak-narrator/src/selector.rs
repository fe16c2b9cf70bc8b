//! Voice selection. Resolves the configured voice identifier against the
//! voices the engine currently offers.

use chatspeak_core::Voice;

/// Pick the voice for `configured_id` from `voices`.
///
/// The first voice whose URI or language tag equals `configured_id` wins. If
/// nothing matches (or no voice is configured), the first available voice is
/// used. Returns `None` only when `voices` is empty.
#[must_use]
pub fn select<'a>(voices: &'a [Voice], configured_id: &str) -> Option<&'a Voice> {
    if !configured_id.is_empty() {
        if let Some(voice) = voices.iter().find(|v| v.matches(configured_id)) {
            return Some(voice);
        }
    }
    voices.first()
}

/// Holds the available voices and the selection derived from them.
///
/// The selection is recomputed whenever either input changes and is never
/// carried across such a change.
#[derive(Debug, Default)]
pub struct VoiceSelector {
    voices: Vec<Voice>,
    configured_id: String,
    selected: Option<Voice>,
}

impl VoiceSelector {
    /// Create a selector with no voices loaded.
    #[must_use]
    pub fn new(configured_id: impl Into<String>) -> Self {
        Self {
            voices: Vec::new(),
            configured_id: configured_id.into(),
            selected: None,
        }
    }

    /// Replace the available voice list and reselect.
    pub fn set_voices(&mut self, voices: Vec<Voice>) -> Option<&Voice> {
        tracing::info!(count = voices.len(), "Loaded voices");
        self.voices = voices;
        self.reselect()
    }

    /// Change the configured voice identifier.
    ///
    /// Reselects only when the identifier actually changed.
    pub fn set_configured_id(&mut self, configured_id: &str) -> Option<&Voice> {
        if self.configured_id != configured_id {
            configured_id.clone_into(&mut self.configured_id);
            self.reselect();
        }
        self.selected.as_ref()
    }

    /// The voice utterances should currently use.
    #[must_use]
    pub fn selected(&self) -> Option<&Voice> {
        self.selected.as_ref()
    }

    fn reselect(&mut self) -> Option<&Voice> {
        self.selected = select(&self.voices, &self.configured_id).cloned();
        match &self.selected {
            Some(voice) => tracing::info!(
                voice = %voice.name,
                lang = %voice.lang,
                local = voice.local_service,
                "Using voice"
            ),
            None => tracing::debug!("No voice available to select"),
        }
        self.selected.as_ref()
    }
}
