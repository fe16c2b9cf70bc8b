//! Narrator error types.

/// Errors surfaced by the narration runtime.
///
/// Most failure modes (stale ids, missing voices, stalled utterances) are
/// handled inside the narrator and only logged; these are the few that reach
/// a caller.
#[derive(Debug, thiserror::Error)]
pub enum NarratorError {
    /// The narrator task has shut down; the command was not delivered.
    #[error("Narrator is not running")]
    Stopped,

    /// The text-to-speech engine could not be acquired.
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The ambient sound source could not be acquired (e.g. microphone denied).
    #[error("Ambient sound source unavailable: {0}")]
    SoundSourceUnavailable(String),
}
