//! Session wiring: one narrator with its chat feed and liveness monitor.

use std::sync::Arc;
use std::time::Duration;

use chatspeak_core::{ConfigService, SoundPresence, SpeechEngine, Voice};
use tokio::sync::mpsc;

use crate::driver::WatchdogConfig;
use crate::engine::engine_or_silent;
use crate::error::NarratorError;
use crate::feed::{ChatEvent, ChatFeed, STARTUP_GRACE};
use crate::gate::{LivenessConfig, LivenessMonitor};
use crate::narrator::{Narrator, NarratorEvent, NarratorHandle};

/// Tunables for [`NarrationSession::start`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub watchdog: WatchdogConfig,
    pub liveness: LivenessConfig,
    pub startup_grace: Duration,
    /// Voices known at startup. More can arrive later via
    /// [`NarratorHandle::set_voices`].
    pub voices: Vec<Voice>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            watchdog: WatchdogConfig::default(),
            liveness: LivenessConfig::default(),
            startup_grace: STARTUP_GRACE,
            voices: Vec::new(),
        }
    }
}

/// A running narration session.
pub struct NarrationSession {
    narrator: NarratorHandle,
    feed: ChatFeed,
    monitor: LivenessMonitor,
    events: Option<mpsc::UnboundedReceiver<NarratorEvent>>,
}

impl NarrationSession {
    /// Start narrating.
    ///
    /// `engine` and `sound` are the results of acquiring those capabilities.
    /// Either may have failed: speech then runs on a silent engine and the
    /// liveness gate stays open.
    pub fn start(
        engine: Result<Arc<dyn SpeechEngine>, NarratorError>,
        sound: Result<Arc<dyn SoundPresence>, NarratorError>,
        config: &ConfigService,
        options: SessionOptions,
    ) -> Result<Self, NarratorError> {
        let engine = engine_or_silent(engine);
        let (narrator, events) =
            Narrator::with_watchdog(engine, config.subscribe(), options.watchdog);
        let narrator = narrator.spawn();

        if !options.voices.is_empty() {
            narrator.set_voices(options.voices)?;
        }

        let feed = ChatFeed::new(narrator.clone(), config.subscribe(), options.startup_grace);
        let monitor = LivenessMonitor::spawn(sound, narrator.clone(), options.liveness);

        tracing::info!(
            liveness_gate = monitor.is_active(),
            "Narration session started"
        );

        Ok(Self {
            narrator,
            feed,
            monitor,
            events: Some(events),
        })
    }

    /// Handle to the narrator, for user controls and voice updates.
    #[must_use]
    pub const fn narrator(&self) -> &NarratorHandle {
        &self.narrator
    }

    /// Forward a chat-surface event.
    pub fn dispatch(&self, event: ChatEvent) -> Result<(), NarratorError> {
        self.feed.dispatch(event)
    }

    /// Take the narrator event stream. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<NarratorEvent>> {
        self.events.take()
    }

    /// Stop the liveness monitor and the narrator, cancelling any speech.
    pub async fn shutdown(self) {
        self.monitor.stop().await;
        if self.narrator.shutdown().is_err() {
            tracing::debug!("Narrator already stopped");
        }
        tracing::info!("Narration session stopped");
    }
}
