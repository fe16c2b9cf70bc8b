//! Liveness gate: holds narration while the ambient audio source is silent.
//!
//! The source reports a single boolean (is any sound present right now?),
//! sampled at display-refresh rate. Silence must persist for a full window
//! before it is declared, while any sound clears it immediately. The gate
//! drives the narrator's ambient-silence flag only; the user pause flag is a
//! separate axis and is never touched here.

use std::sync::Arc;
use std::time::Duration;

use chatspeak_core::SoundPresence;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::error::NarratorError;
use crate::narrator::NarratorHandle;

/// Default time sound must be absent before silence is declared.
pub const SILENCE_WINDOW: Duration = Duration::from_millis(500);

/// Default sampling period (one display frame at 60Hz).
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(16);

/// Debounced state reported by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Sound is present; narration may proceed.
    Sound,
    /// Sound has been absent for the whole silence window.
    Silent,
}

/// Debounce state machine over raw sound-presence samples.
#[derive(Debug, Clone)]
pub struct LivenessGate {
    window: Duration,
    silent: bool,
    /// When the current run of silent samples began.
    silence_since: Option<Instant>,
}

impl LivenessGate {
    /// Create a gate that starts in the [`Liveness::Sound`] state.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            silent: false,
            silence_since: None,
        }
    }

    /// Current debounced state.
    #[must_use]
    pub const fn liveness(&self) -> Liveness {
        if self.silent {
            Liveness::Silent
        } else {
            Liveness::Sound
        }
    }

    /// Feed one sample taken at `now`.
    ///
    /// Returns the new state on a transition, `None` otherwise.
    pub fn observe(&mut self, sound_present: bool, now: Instant) -> Option<Liveness> {
        if sound_present {
            self.silence_since = None;
            if self.silent {
                self.silent = false;
                return Some(Liveness::Sound);
            }
            return None;
        }

        let since = *self.silence_since.get_or_insert(now);
        if !self.silent && now.saturating_duration_since(since) >= self.window {
            self.silent = true;
            return Some(Liveness::Silent);
        }
        None
    }
}

impl Default for LivenessGate {
    fn default() -> Self {
        Self::new(SILENCE_WINDOW)
    }
}

/// Timing for [`LivenessMonitor`].
#[derive(Debug, Clone, Copy)]
pub struct LivenessConfig {
    pub silence_window: Duration,
    pub sample_interval: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            silence_window: SILENCE_WINDOW,
            sample_interval: SAMPLE_INTERVAL,
        }
    }
}

/// Background task that samples a [`SoundPresence`] source and forwards
/// gate transitions to a narrator.
pub struct LivenessMonitor {
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LivenessMonitor {
    /// Start monitoring `source`.
    ///
    /// If the source could not be acquired the failure is logged and no task
    /// is started: narration is then never held for silence.
    pub fn spawn(
        source: Result<Arc<dyn SoundPresence>, NarratorError>,
        narrator: NarratorHandle,
        config: LivenessConfig,
    ) -> Self {
        let cancel_token = CancellationToken::new();

        let task = match source {
            Ok(source) => Some(tokio::spawn(sample_loop(
                source,
                narrator,
                config,
                cancel_token.clone(),
            ))),
            Err(e) => {
                tracing::warn!(error = %e, "Ambient audio unavailable, liveness gate disabled");
                None
            }
        };

        Self { cancel_token, task }
    }

    /// Whether a sampling task is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop sampling and wait for the task to exit.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Liveness monitor task failed");
            }
        }
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn sample_loop(
    source: Arc<dyn SoundPresence>,
    narrator: NarratorHandle,
    config: LivenessConfig,
    cancel_token: CancellationToken,
) {
    let mut gate = LivenessGate::new(config.silence_window);
    let mut ticker = interval(config.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(
        window_ms = config.silence_window.as_millis(),
        "Starting liveness monitor"
    );

    loop {
        tokio::select! {
            biased;
            () = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(liveness) = gate.observe(source.sound_present(), Instant::now()) else {
                    continue;
                };
                tracing::debug!(?liveness, "Ambient liveness changed");
                if narrator.set_ambient_silence(liveness == Liveness::Silent).is_err() {
                    tracing::debug!("Narrator stopped, ending liveness monitor");
                    break;
                }
            }
        }
    }

    tracing::debug!("Liveness monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SilentEngine;
    use crate::narrator::Narrator;
    use chatspeak_core::VoiceConfig;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn starts_live() {
        assert_eq!(LivenessGate::default().liveness(), Liveness::Sound);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_declared_after_full_window() {
        let mut gate = LivenessGate::new(WINDOW);
        let t0 = Instant::now();

        assert_eq!(gate.observe(false, t0), None);
        assert_eq!(gate.observe(false, t0 + Duration::from_millis(499)), None);
        assert_eq!(
            gate.observe(false, t0 + WINDOW),
            Some(Liveness::Silent)
        );
        assert_eq!(gate.observe(false, t0 + Duration::from_secs(2)), None);
        assert_eq!(gate.liveness(), Liveness::Silent);
    }

    #[tokio::test(start_paused = true)]
    async fn sound_cancels_pending_silence() {
        let mut gate = LivenessGate::new(WINDOW);
        let t0 = Instant::now();

        gate.observe(false, t0);
        gate.observe(true, t0 + Duration::from_millis(400));
        assert_eq!(gate.observe(false, t0 + Duration::from_millis(600)), None);
        assert_eq!(gate.observe(false, t0 + Duration::from_millis(1000)), None);
        assert_eq!(
            gate.observe(false, t0 + Duration::from_millis(1100)),
            Some(Liveness::Silent)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sound_resumes_immediately() {
        let mut gate = LivenessGate::new(WINDOW);
        let t0 = Instant::now();

        gate.observe(false, t0);
        gate.observe(false, t0 + WINDOW);
        assert_eq!(
            gate.observe(true, t0 + WINDOW + Duration::from_millis(16)),
            Some(Liveness::Sound)
        );
        assert_eq!(gate.observe(true, t0 + Duration::from_secs(1)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_source_disables_monitor() {
        let (_config_tx, config_rx) = tokio::sync::watch::channel(VoiceConfig::default());
        let (narrator, _events) = Narrator::new(Arc::new(SilentEngine), config_rx);
        let narrator = narrator.spawn();
        let monitor = LivenessMonitor::spawn(
            Err(NarratorError::SoundSourceUnavailable("denied".to_string())),
            narrator,
            LivenessConfig::default(),
        );
        assert!(!monitor.is_active());
        monitor.stop().await;
    }
}
