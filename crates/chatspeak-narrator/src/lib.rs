//! Live chat narration runtime.
//!
//! Reads chat messages aloud one at a time, in arrival order, through a
//! pluggable [`SpeechEngine`](chatspeak_core::SpeechEngine):
//!
//! - [`narrator`]: the speech-queue state machine and its actor handle
//! - [`driver`]: utterance submission and the stall watchdog
//! - [`selector`]: voice resolution against the engine's voice list
//! - [`gate`]: ambient-sound liveness gate
//! - [`feed`]: chat-surface event routing
//! - [`session`]: wiring of all of the above

#![deny(unused_crate_dependencies)]

// Only the integration tests install a subscriber.
#[cfg(test)]
use tracing_subscriber as _;
#[cfg(test)]
use tokio_test as _;

pub mod driver;
pub mod engine;
pub mod error;
pub mod feed;
pub mod gate;
pub mod narrator;
pub mod queue;
pub mod selector;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use driver::{SpeechDriver, UtteranceEnd, UtteranceId, UtteranceOutcome, WatchdogConfig};
pub use engine::{SilentEngine, engine_or_silent};
pub use error::NarratorError;
pub use feed::{ChatEvent, ChatFeed};
pub use gate::{Liveness, LivenessConfig, LivenessGate, LivenessMonitor};
pub use narrator::{Narrator, NarratorEvent, NarratorHandle, NarratorSnapshot};
pub use queue::MessageQueue;
pub use selector::VoiceSelector;
pub use session::{NarrationSession, SessionOptions};
