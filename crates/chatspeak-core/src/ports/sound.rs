//! Ambient sound presence port.

/// A continuously sampled "is there sound right now" signal.
///
/// Implementations project whatever audio analysis they perform down to a
/// single boolean; the liveness monitor never sees raw audio.
pub trait SoundPresence: Send + Sync {
    /// Whether sound above the detection threshold is present at this instant.
    fn sound_present(&self) -> bool;
}
