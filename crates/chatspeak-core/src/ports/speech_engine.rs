//! Text-to-speech engine capability port.

use thiserror::Error;

use crate::voice::Utterance;

/// Errors reported by a speech engine when an utterance cannot be submitted.
#[derive(Debug, Clone, Error)]
pub enum SpeechEngineError {
    /// The engine refused this particular utterance.
    #[error("Utterance rejected: {0}")]
    Rejected(String),
}

/// Capability interface over a text-to-speech engine.
///
/// Engines are assumed to expose a single global "currently speaking" flag
/// and no trustworthy per-utterance completion callback, so completion is
/// detected by polling [`is_speaking`](SpeechEngine::is_speaking).
///
/// All methods take `&self` so implementations can be shared as
/// `Arc<dyn SpeechEngine>` between the narrator and the stall watchdog.
pub trait SpeechEngine: Send + Sync {
    /// Submit one utterance for playback.
    fn submit(&self, utterance: &Utterance) -> Result<(), SpeechEngineError>;

    /// Whether anything is currently being spoken (or is paused mid-utterance).
    fn is_speaking(&self) -> bool;

    /// Stop and discard everything the engine is speaking or has queued.
    fn cancel(&self);

    /// Pause playback without discarding the current utterance.
    fn pause(&self);

    /// Resume paused playback.
    fn resume(&self);
}
