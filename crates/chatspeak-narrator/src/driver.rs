//! Speech driver: submits utterances to the engine and detects their end.
//!
//! Engines expose no trustworthy per-utterance completion callback, so every
//! submitted utterance gets a watchdog task that polls the engine's global
//! "speaking" flag:
//!
//! ```text
//!   submit ──► tick every 200ms ──► not speaking? ──► Completed
//!                    │
//!                    └──► still speaking after 30s? ──► engine.cancel() ──► Stalled
//! ```
//!
//! Outcomes are delivered on an unbounded channel tagged with the
//! [`UtteranceId`] they belong to. Cancelling an utterance stops its watchdog
//! via a [`CancellationToken`]; consumers must still compare the id against the
//! utterance they consider current, since an outcome may already be in flight
//! when the cancellation happens.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chatspeak_core::{SpeechEngine, Utterance};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// How often the watchdog polls the engine.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Longest an utterance may keep the engine busy before it is force-cancelled.
pub const STALL_CEILING: Duration = Duration::from_secs(30);

/// Identity of one submitted utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utterance-{}", self.0)
    }
}

/// How an utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceEnd {
    /// The engine stopped speaking on its own.
    Completed,
    /// The engine was still speaking at the stall ceiling and was cancelled.
    Stalled,
    /// The engine refused the submission.
    Rejected,
}

/// End-of-utterance signal emitted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtteranceOutcome {
    pub id: UtteranceId,
    pub end: UtteranceEnd,
}

/// Watchdog timing.
#[derive(Debug, Clone, Copy)]
pub struct WatchdogConfig {
    /// Interval between engine polls.
    pub poll_interval: Duration,
    /// Force-cancel threshold.
    pub stall_ceiling: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            stall_ceiling: STALL_CEILING,
        }
    }
}

/// The utterance whose watchdog is currently running.
struct ActiveUtterance {
    id: UtteranceId,
    cancel: CancellationToken,
}

/// Drives a [`SpeechEngine`] one utterance at a time.
pub struct SpeechDriver {
    engine: Arc<dyn SpeechEngine>,
    outcome_tx: mpsc::UnboundedSender<UtteranceOutcome>,
    watchdog: WatchdogConfig,
    next_id: u64,
    active: Option<ActiveUtterance>,
}

impl SpeechDriver {
    /// Create a driver for `engine`.
    ///
    /// Returns the driver and the receiver on which utterance outcomes arrive.
    /// Must be used from within a tokio runtime (watchdogs are spawned tasks).
    #[must_use]
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        watchdog: WatchdogConfig,
    ) -> (Self, mpsc::UnboundedReceiver<UtteranceOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let driver = Self {
            engine,
            outcome_tx,
            watchdog,
            next_id: 0,
            active: None,
        };
        (driver, outcome_rx)
    }

    /// Submit `utterance` and start its watchdog.
    ///
    /// A rejected submission is reported as [`UtteranceEnd::Rejected`] on the
    /// outcome channel rather than as an error, so the caller's advancement
    /// logic has a single path.
    pub fn speak(&mut self, utterance: &Utterance) -> UtteranceId {
        if let Some(previous) = self.active.take() {
            tracing::warn!(utterance = %previous.id, "Speaking over an active utterance");
            previous.cancel.cancel();
        }

        let id = UtteranceId(self.next_id);
        self.next_id += 1;

        if let Err(e) = self.engine.submit(utterance) {
            tracing::warn!(utterance = %id, error = %e, "Speech engine rejected utterance");
            self.send(UtteranceOutcome {
                id,
                end: UtteranceEnd::Rejected,
            });
            return id;
        }

        let cancel = CancellationToken::new();
        tokio::spawn(watch_utterance(
            Arc::clone(&self.engine),
            id,
            cancel.clone(),
            self.outcome_tx.clone(),
            self.watchdog,
        ));
        self.active = Some(ActiveUtterance { id, cancel });

        tracing::debug!(utterance = %id, "Utterance submitted");
        id
    }

    /// Stop the in-flight utterance (if any) immediately.
    ///
    /// The engine is always told to cancel, even when no utterance is being
    /// watched, so stray engine output is flushed as well.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            tracing::debug!(utterance = %active.id, "Utterance cancelled");
        }
        self.engine.cancel();
    }

    /// Mark `id` as finished after its outcome has been consumed.
    ///
    /// Returns `false` if `id` is not the utterance being watched.
    pub fn finish(&mut self, id: UtteranceId) -> bool {
        if self.active.as_ref().is_some_and(|a| a.id == id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Whether an utterance is being watched.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Pause engine playback without touching the queue.
    pub fn pause_playback(&self) {
        self.engine.pause();
    }

    /// Resume engine playback.
    pub fn resume_playback(&self) {
        self.engine.resume();
    }

    fn send(&self, outcome: UtteranceOutcome) {
        if self.outcome_tx.send(outcome).is_err() {
            tracing::debug!(utterance = %outcome.id, "Utterance outcome receiver dropped");
        }
    }
}

impl Drop for SpeechDriver {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

/// Poll the engine until the utterance ends, stalls, or is cancelled.
async fn watch_utterance(
    engine: Arc<dyn SpeechEngine>,
    id: UtteranceId,
    cancel: CancellationToken,
    outcome_tx: mpsc::UnboundedSender<UtteranceOutcome>,
    config: WatchdogConfig,
) {
    let started = Instant::now();
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::trace!(utterance = %id, "Watchdog stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        let end = if !engine.is_speaking() {
            UtteranceEnd::Completed
        } else if started.elapsed() >= config.stall_ceiling {
            // Long utterances (e.g. hundreds of emoji names) can stop playing
            // while the engine still reports speaking.
            tracing::warn!(
                utterance = %id,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Utterance was speaking longer than the stall ceiling and was stopped"
            );
            engine.cancel();
            UtteranceEnd::Stalled
        } else {
            continue;
        };

        let _ = outcome_tx.send(UtteranceOutcome { id, end });
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatspeak_core::{SpeechEngineError, Voice};
    use mockall::mock;
    use std::sync::atomic::{AtomicBool, Ordering};

    mock! {
        Engine {}

        impl SpeechEngine for Engine {
            fn submit(&self, utterance: &Utterance) -> Result<(), SpeechEngineError>;
            fn is_speaking(&self) -> bool;
            fn cancel(&self);
            fn pause(&self);
            fn resume(&self);
        }
    }

    fn driver_for(
        engine: MockEngine,
    ) -> (SpeechDriver, mpsc::UnboundedReceiver<UtteranceOutcome>) {
        SpeechDriver::new(Arc::new(engine), WatchdogConfig::default())
    }

    fn utterance(text: &str) -> Utterance {
        Utterance {
            text: text.to_string(),
            voice: Voice::new("urn:voice:test", "Test", "en-US"),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completion_is_signalled_when_engine_goes_quiet() {
        let speaking = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&speaking);

        let mut engine = MockEngine::new();
        engine.expect_submit().times(1).returning(|_| Ok(()));
        engine
            .expect_is_speaking()
            .returning(move || flag.load(Ordering::SeqCst));
        engine.expect_cancel().never();

        let (mut driver, mut outcomes) = driver_for(engine);
        let id = driver.speak(&utterance("hello"));

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(outcomes.try_recv().is_err(), "still speaking, no outcome yet");

        speaking.store(false, Ordering::SeqCst);
        let outcome = outcomes.recv().await.unwrap();
        assert_eq!(
            outcome,
            UtteranceOutcome {
                id,
                end: UtteranceEnd::Completed,
            }
        );
        assert!(driver.finish(id));
        assert!(!driver.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_utterance_is_cancelled_at_the_ceiling() {
        let mut engine = MockEngine::new();
        engine.expect_submit().times(1).returning(|_| Ok(()));
        engine.expect_is_speaking().returning(|| true);
        engine.expect_cancel().times(1).return_const(());

        let (mut driver, mut outcomes) = driver_for(engine);
        let started = Instant::now();
        let id = driver.speak(&utterance("a very long message"));

        let outcome = outcomes.recv().await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(
            outcome,
            UtteranceOutcome {
                id,
                end: UtteranceEnd::Stalled,
            }
        );
        assert!(elapsed >= STALL_CEILING, "fired early: {elapsed:?}");
        assert!(elapsed <= STALL_CEILING + POLL_INTERVAL, "fired late: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_silences_the_watchdog() {
        let mut engine = MockEngine::new();
        engine.expect_submit().times(1).returning(|_| Ok(()));
        engine.expect_is_speaking().returning(|| true);
        engine.expect_cancel().times(1).return_const(());

        let (mut driver, mut outcomes) = driver_for(engine);
        driver.speak(&utterance("hello"));
        tokio::time::sleep(Duration::from_millis(500)).await;

        driver.cancel();
        assert!(!driver.is_active());

        tokio::time::sleep(STALL_CEILING * 2).await;
        assert!(outcomes.try_recv().is_err(), "cancelled watchdog must not signal");
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_submission_is_reported_as_outcome() {
        let mut engine = MockEngine::new();
        engine
            .expect_submit()
            .times(1)
            .returning(|_| Err(SpeechEngineError::Rejected("too long".to_string())));
        engine.expect_is_speaking().never();

        let (mut driver, mut outcomes) = driver_for(engine);
        let id = driver.speak(&utterance("hello"));

        let outcome = outcomes.recv().await.unwrap();
        assert_eq!(
            outcome,
            UtteranceOutcome {
                id,
                end: UtteranceEnd::Rejected,
            }
        );
        assert!(!driver.is_active());
    }

    #[tokio::test]
    async fn finish_ignores_foreign_ids() {
        let mut engine = MockEngine::new();
        engine.expect_submit().returning(|_| Ok(()));
        engine.expect_is_speaking().returning(|| true);
        engine.expect_cancel().return_const(());

        let (mut driver, _outcomes) = driver_for(engine);
        let first = driver.speak(&utterance("one"));
        driver.cancel();
        let second = driver.speak(&utterance("two"));

        assert_ne!(first, second);
        assert!(!driver.finish(first));
        assert!(driver.finish(second));
    }
}
