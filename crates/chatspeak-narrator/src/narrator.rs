//! The speech-queue state machine.
//!
//! The narrator owns the pending-message queue and decides when the next
//! message is spoken:
//!
//! ```text
//!   enqueue ──► try_advance ──► speak(head) ──► watchdog outcome
//!                   ▲                                  │
//!                   │                        delete entry, clear current
//!                   │                                  ▼
//!                   └─────────────────────────── delay window
//! ```
//!
//! `try_advance` is guarded (not paused, not delaying, not detached, no
//! ambient silence, nothing current, queue non-empty, a voice available), so
//! it is called after every mutating event without ever speaking twice.
//!
//! # Execution model
//!
//! [`Narrator::spawn`] moves the narrator into a single tokio task that
//! processes chat commands, watchdog outcomes, config changes and the delay
//! timer one at a time. Every transition runs to completion before the next
//! event is looked at, so queue and current-message state need no locking.
//! Callers talk to the task through the cloneable [`NarratorHandle`].

use std::sync::Arc;

use std::ops::ControlFlow;

use chatspeak_core::config::MAX_DELAY;
use chatspeak_core::{ChatMessage, MessageId, SpeechEngine, Utterance, Voice, VoiceConfig};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};

use crate::driver::{SpeechDriver, UtteranceEnd, UtteranceId, UtteranceOutcome, WatchdogConfig};
use crate::error::NarratorError;
use crate::queue::MessageQueue;
use crate::selector::VoiceSelector;

// ── State ──────────────────────────────────────────────────────────

/// Flags and pointer that gate advancement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NarratorState {
    /// Message currently being spoken.
    pub(crate) current: Option<MessageId>,

    /// Explicit user pause.
    pub(crate) paused: bool,

    /// Inside the gap after an utterance.
    pub(crate) delaying: bool,

    /// The chat surface moved to a popout; narration is handed off.
    pub(crate) detached: bool,

    /// The liveness gate reports silence; playback is held.
    pub(crate) ambient_silence: bool,
}

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by the narrator to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum NarratorEvent {
    /// A message was handed to the speech engine.
    UtteranceStarted { id: MessageId, text: String },

    /// A message finished speaking (normally, by stall, or by rejection).
    UtteranceFinished { id: MessageId, end: UtteranceEnd },

    /// The message being spoken was removed and its utterance cancelled.
    UtteranceCancelled { id: MessageId },

    /// The user pause flag changed.
    PauseChanged(bool),

    /// The detached flag changed.
    DetachedChanged(bool),

    /// The liveness gate changed.
    AmbientSilenceChanged(bool),

    /// Pending messages were discarded in bulk (detach or emergency stop).
    QueueFlushed { count: usize },

    /// A voice was (re)selected.
    VoiceSelected { uri: String, name: String },
}

/// Point-in-time view of the narrator, for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarratorSnapshot {
    pub current: Option<MessageId>,
    pub queued: Vec<MessageId>,
    pub paused: bool,
    pub delaying: bool,
    pub detached: bool,
    pub ambient_silence: bool,
    /// URI of the selected voice, if any.
    pub voice: Option<String>,
}

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from a [`NarratorHandle`] to the narrator task.
enum NarratorCommand {
    Enqueue(ChatMessage),
    Rename { old: MessageId, new: MessageId },
    Remove(MessageId),
    SetDetached(bool),
    TogglePause,
    EmergencyStop,
    SetAmbientSilence(bool),
    SetVoices(Vec<Voice>),
    Snapshot { reply: oneshot::Sender<NarratorSnapshot> },
    Shutdown,
}

// ── Narrator ───────────────────────────────────────────────────────

/// The speech-queue state machine.
///
/// Built with [`new`](Self::new) and driven only through the
/// [`NarratorHandle`] returned by [`spawn`](Self::spawn): watchdog outcomes
/// and the delay timer are consumed by the narrator task, so the state
/// machine cannot make progress outside it. Must be spawned inside a tokio
/// runtime.
pub struct Narrator {
    queue: MessageQueue,
    state: NarratorState,

    /// Utterance bound to `state.current`; outcomes for any other id are stale.
    utterance: Option<UtteranceId>,

    /// End of the current delay window.
    delay_until: Option<Instant>,

    driver: SpeechDriver,

    /// Watchdog outcomes; moved into the task by `run`.
    outcomes: Option<mpsc::UnboundedReceiver<UtteranceOutcome>>,

    voices: VoiceSelector,

    /// Read-only view of the live voice config.
    config: watch::Receiver<VoiceConfig>,

    event_tx: mpsc::UnboundedSender<NarratorEvent>,
}

impl Narrator {
    /// Create a narrator with the default watchdog timing.
    ///
    /// Returns the narrator and a receiver for [`NarratorEvent`]s.
    #[must_use]
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        config: watch::Receiver<VoiceConfig>,
    ) -> (Self, mpsc::UnboundedReceiver<NarratorEvent>) {
        Self::with_watchdog(engine, config, WatchdogConfig::default())
    }

    /// Create a narrator with explicit watchdog timing.
    #[must_use]
    pub fn with_watchdog(
        engine: Arc<dyn SpeechEngine>,
        mut config: watch::Receiver<VoiceConfig>,
        watchdog: WatchdogConfig,
    ) -> (Self, mpsc::UnboundedReceiver<NarratorEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (driver, outcomes) = SpeechDriver::new(engine, watchdog);
        let voice_type = config.borrow_and_update().voice_type.clone();

        let narrator = Self {
            queue: MessageQueue::new(),
            state: NarratorState::default(),
            utterance: None,
            delay_until: None,
            driver,
            outcomes: Some(outcomes),
            voices: VoiceSelector::new(voice_type),
            config,
            event_tx,
        };

        (narrator, event_rx)
    }

    /// Point-in-time view for status reporting.
    fn snapshot(&self) -> NarratorSnapshot {
        NarratorSnapshot {
            current: self.state.current.clone(),
            queued: self.queue.ids(),
            paused: self.state.paused,
            delaying: self.state.delaying,
            detached: self.state.detached,
            ambient_silence: self.state.ambient_silence,
            voice: self.voices.selected().map(|v| v.uri.clone()),
        }
    }

    // ── Chat operations ────────────────────────────────────────────

    /// Queue a message at the tail.
    ///
    /// Ignored while detached or if the id is already queued (the first
    /// author/body wins).
    fn enqueue(&mut self, message: ChatMessage) {
        if self.state.detached {
            tracing::trace!(message = %message.id, "Chat detached, message not queued");
            return;
        }

        let id = message.id.clone();
        if !self.queue.insert(message) {
            tracing::trace!(message = %id, "Message already queued");
            return;
        }

        tracing::debug!(message = %id, queued = self.queue.len(), "Message queued");
        self.try_advance();
    }

    /// Re-key a queued message. The utterance in flight, if it belongs to
    /// `old`, keeps playing under the new identity.
    fn rename(&mut self, old: &MessageId, new: MessageId) {
        if !self.queue.rename(old, new.clone()) {
            tracing::trace!(old = %old, new = %new, "Rename for unknown message ignored");
            return;
        }

        tracing::debug!(old = %old, new = %new, "Message renamed");
        if self.state.current.as_ref() == Some(old) {
            self.state.current = Some(new);
        }
    }

    /// Drop a queued message, cancelling its utterance if it is being spoken.
    fn remove(&mut self, id: &MessageId) {
        if !self.queue.contains(id) {
            tracing::trace!(message = %id, "Remove for unknown message ignored");
            return;
        }

        let was_current = self.state.current.as_ref() == Some(id);
        if was_current {
            self.driver.cancel();
            self.utterance = None;
            self.state.current = None;
            tracing::debug!(message = %id, "Stopped current message");
            self.emit(NarratorEvent::UtteranceCancelled { id: id.clone() });
        }

        self.queue.remove(id);

        if was_current {
            self.try_advance();
        }
    }

    /// Record whether the chat surface is detached to a popout.
    ///
    /// Attaching → detaching discards the whole backlog (including the
    /// message being spoken); detaching → attaching only re-enables queueing
    /// of new messages.
    fn set_detached(&mut self, detached: bool) {
        if self.state.detached == detached {
            return;
        }

        self.state.detached = detached;
        tracing::info!(detached, "Chat detached state changed");
        self.emit(NarratorEvent::DetachedChanged(detached));

        if detached && !self.queue.is_empty() {
            let ids = self.queue.ids();
            for id in &ids {
                self.remove(id);
            }
            self.emit(NarratorEvent::QueueFlushed { count: ids.len() });
        }
    }

    // ── User controls ──────────────────────────────────────────────

    /// Flip the user pause flag. Pausing lets the current message finish;
    /// unpausing resumes with the next one.
    fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
        tracing::info!(paused = self.state.paused, "Narration pause toggled");
        self.emit(NarratorEvent::PauseChanged(self.state.paused));

        if !self.state.paused {
            self.try_advance();
        }
    }

    /// Stop speaking immediately and discard everything queued.
    fn emergency_stop(&mut self) {
        self.driver.cancel();
        self.utterance = None;
        if let Some(id) = self.state.current.take() {
            self.emit(NarratorEvent::UtteranceCancelled { id });
        }

        let count = self.queue.clear();
        tracing::info!(count, "Emergency stop, queue cleared");
        self.emit(NarratorEvent::QueueFlushed { count });
    }

    // ── Liveness gate ──────────────────────────────────────────────

    /// Hold or release playback based on ambient sound.
    ///
    /// Independent of the user pause flag: both must be clear for narration
    /// to advance.
    fn set_ambient_silence(&mut self, silent: bool) {
        if self.state.ambient_silence == silent {
            return;
        }

        self.state.ambient_silence = silent;
        tracing::debug!(silent, "Ambient silence changed");
        self.emit(NarratorEvent::AmbientSilenceChanged(silent));

        if silent {
            self.driver.pause_playback();
        } else {
            self.driver.resume_playback();
            self.try_advance();
        }
    }

    // ── Voices and config ──────────────────────────────────────────

    /// Replace the list of voices offered by the engine.
    fn set_voices(&mut self, voices: Vec<Voice>) {
        if let Some(voice) = self.voices.set_voices(voices) {
            let event = NarratorEvent::VoiceSelected {
                uri: voice.uri.clone(),
                name: voice.name.clone(),
            };
            self.emit(event);
        }
        self.try_advance();
    }

    /// React to a published config change.
    fn on_config_changed(&mut self) {
        let voice_type = self.config.borrow_and_update().voice_type.clone();
        let previous = self.voices.selected().map(|v| v.uri.clone());

        if let Some(voice) = self.voices.set_configured_id(&voice_type) {
            if previous.as_deref() != Some(voice.uri.as_str()) {
                let event = NarratorEvent::VoiceSelected {
                    uri: voice.uri.clone(),
                    name: voice.name.clone(),
                };
                self.emit(event);
            }
        }
    }

    // ── Advancement ────────────────────────────────────────────────

    /// Speak the head of the queue if nothing gates it.
    fn try_advance(&mut self) {
        if self.state.paused
            || self.state.delaying
            || self.state.detached
            || self.state.ambient_silence
            || self.state.current.is_some()
        {
            return;
        }

        let Some(message) = self.queue.front() else {
            return;
        };

        let Some(voice) = self.voices.selected() else {
            tracing::warn!(queued = self.queue.len(), "No voices loaded, narration deferred");
            return;
        };

        let utterance = {
            let config = self.config.borrow();
            Utterance {
                text: message.utterance_text(),
                voice: voice.clone(),
                rate: config.rate,
                pitch: config.pitch,
                volume: config.volume,
            }
        };
        let id = message.id.clone();

        tracing::info!(message = %id, queued = self.queue.len(), "{}", utterance.text);

        self.state.current = Some(id.clone());
        self.utterance = Some(self.driver.speak(&utterance));
        self.emit(NarratorEvent::UtteranceStarted {
            id,
            text: utterance.text,
        });
    }

    /// Handle a watchdog outcome.
    fn on_utterance_end(&mut self, outcome: UtteranceOutcome) {
        if self.utterance != Some(outcome.id) {
            tracing::trace!(utterance = %outcome.id, "Outcome for stale utterance ignored");
            return;
        }

        self.driver.finish(outcome.id);
        self.utterance = None;

        if let Some(id) = self.state.current.take() {
            self.queue.remove(&id);
            self.emit(NarratorEvent::UtteranceFinished {
                id,
                end: outcome.end,
            });
        }

        self.begin_delay();
    }

    fn begin_delay(&mut self) {
        let delay = self.config.borrow().delay_duration();
        let now = Instant::now();
        let until = now
            .checked_add(delay)
            .or_else(|| now.checked_add(MAX_DELAY))
            .unwrap_or(now);
        self.delay_until = Some(until);
        self.state.delaying = true;
    }

    fn end_delay(&mut self) {
        self.delay_until = None;
        self.state.delaying = false;
        self.try_advance();
    }

    // ── Actor ──────────────────────────────────────────────────────

    /// Move the narrator into its own task and return a handle to it.
    pub fn spawn(self) -> NarratorHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(cmd_rx));
        NarratorHandle { cmd_tx }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<NarratorCommand>) {
        let Some(mut outcomes) = self.outcomes.take() else {
            tracing::warn!("Narrator already ran");
            return;
        };
        let mut config_open = true;

        tracing::info!("Narrator started");

        loop {
            let delay_until = self.delay_until;

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle(command).is_break() {
                        break;
                    }
                }
                Some(outcome) = outcomes.recv() => self.on_utterance_end(outcome),
                changed = self.config.changed(), if config_open => {
                    if changed.is_ok() {
                        self.on_config_changed();
                    } else {
                        tracing::debug!("Config publisher dropped, keeping last config");
                        config_open = false;
                    }
                }
                () = sleep_until(delay_until.unwrap_or_else(Instant::now)),
                    if delay_until.is_some() =>
                {
                    self.end_delay();
                }
            }
        }

        self.driver.cancel();
        tracing::info!("Narrator stopped");
    }

    fn handle(&mut self, command: NarratorCommand) -> ControlFlow<()> {
        match command {
            NarratorCommand::Enqueue(message) => self.enqueue(message),
            NarratorCommand::Rename { old, new } => self.rename(&old, new),
            NarratorCommand::Remove(id) => self.remove(&id),
            NarratorCommand::SetDetached(detached) => self.set_detached(detached),
            NarratorCommand::TogglePause => self.toggle_pause(),
            NarratorCommand::EmergencyStop => self.emergency_stop(),
            NarratorCommand::SetAmbientSilence(silent) => self.set_ambient_silence(silent),
            NarratorCommand::SetVoices(voices) => self.set_voices(voices),
            NarratorCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            NarratorCommand::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Emit an event. A dropped receiver is not an error.
    fn emit(&self, event: NarratorEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Narrator event receiver dropped");
        }
    }
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable, `Send + Sync` handle to a spawned [`Narrator`].
///
/// Commands are fire-and-forget: they are queued for the narrator task and
/// never block. They fail only once the task has stopped.
#[derive(Clone)]
pub struct NarratorHandle {
    cmd_tx: mpsc::UnboundedSender<NarratorCommand>,
}

impl NarratorHandle {
    /// Queue a chat message.
    pub fn enqueue(
        &self,
        id: impl Into<MessageId>,
        author: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), NarratorError> {
        self.send(NarratorCommand::Enqueue(ChatMessage::new(id, author, body)))
    }

    /// Re-key a queued message.
    pub fn rename(
        &self,
        old: impl Into<MessageId>,
        new: impl Into<MessageId>,
    ) -> Result<(), NarratorError> {
        self.send(NarratorCommand::Rename {
            old: old.into(),
            new: new.into(),
        })
    }

    /// Drop a queued message.
    pub fn remove(&self, id: impl Into<MessageId>) -> Result<(), NarratorError> {
        self.send(NarratorCommand::Remove(id.into()))
    }

    /// Report the chat surface's detached state.
    pub fn set_detached(&self, detached: bool) -> Result<(), NarratorError> {
        self.send(NarratorCommand::SetDetached(detached))
    }

    /// Flip the user pause flag.
    pub fn toggle_pause(&self) -> Result<(), NarratorError> {
        self.send(NarratorCommand::TogglePause)
    }

    /// Stop speaking and discard the queue.
    pub fn emergency_stop(&self) -> Result<(), NarratorError> {
        self.send(NarratorCommand::EmergencyStop)
    }

    /// Liveness gate input.
    pub fn set_ambient_silence(&self, silent: bool) -> Result<(), NarratorError> {
        self.send(NarratorCommand::SetAmbientSilence(silent))
    }

    /// Replace the available voices.
    pub fn set_voices(&self, voices: Vec<Voice>) -> Result<(), NarratorError> {
        self.send(NarratorCommand::SetVoices(voices))
    }

    /// Fetch a snapshot of the narrator state.
    ///
    /// Also acts as a barrier: every command sent before it has been applied
    /// when the snapshot arrives.
    pub async fn snapshot(&self) -> Result<NarratorSnapshot, NarratorError> {
        let (reply, rx) = oneshot::channel();
        self.send(NarratorCommand::Snapshot { reply })?;
        rx.await.map_err(|_| NarratorError::Stopped)
    }

    /// Cancel any speech and stop the narrator task.
    pub fn shutdown(&self) -> Result<(), NarratorError> {
        self.send(NarratorCommand::Shutdown)
    }

    /// Whether the narrator task is still accepting commands.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    fn send(&self, command: NarratorCommand) -> Result<(), NarratorError> {
        self.cmd_tx.send(command).map_err(|_| NarratorError::Stopped)
    }
}
