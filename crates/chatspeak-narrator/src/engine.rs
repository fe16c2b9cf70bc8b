//! Engine acquisition and the silent fallback engine.

use std::sync::Arc;

use chatspeak_core::{SpeechEngine, SpeechEngineError, Utterance};

use crate::error::NarratorError;

/// A speech engine that produces no audio.
///
/// Used when the real engine cannot be acquired: it never reports speaking,
/// so queued messages drain at the normal cadence instead of piling up.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentEngine;

impl SpeechEngine for SilentEngine {
    fn submit(&self, utterance: &Utterance) -> Result<(), SpeechEngineError> {
        tracing::debug!(text = %utterance.text, "Silent engine dropping utterance");
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn cancel(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}
}

/// Resolve the result of acquiring a speech engine.
///
/// Acquisition failures (permission denied, engine missing) are logged and
/// replaced by [`SilentEngine`] so narration keeps running.
pub fn engine_or_silent(
    acquired: Result<Arc<dyn SpeechEngine>, NarratorError>,
) -> Arc<dyn SpeechEngine> {
    match acquired {
        Ok(engine) => engine,
        Err(e) => {
            tracing::warn!(error = %e, "Speech output unavailable, continuing without audio");
            Arc::new(SilentEngine)
        }
    }
}
