//! Chat feed: translates chat-surface events into narrator operations.

use std::time::Duration;

use chatspeak_core::{MessageFragment, MessageId, VoiceConfig, has_speakable_text, render_body};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::NarratorError;
use crate::narrator::NarratorHandle;

/// Messages arriving this soon after the feed starts are backlog the chat
/// surface replays on load, not live chat.
pub const STARTUP_GRACE: Duration = Duration::from_secs(2);

/// A change observed on the chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    /// A new text message appeared.
    MessageAdded {
        id: MessageId,
        author: String,
        fragments: Vec<MessageFragment>,
    },
    /// A message received its final id (own messages start with a temporary one).
    MessageRenamed { old: MessageId, new: MessageId },
    /// A message was deleted by its author or a moderator.
    MessageDeleted { id: MessageId },
    /// The chat moved into (or back from) a popout window.
    DetachedChanged { detached: bool },
}

/// Routes [`ChatEvent`]s to a narrator.
pub struct ChatFeed {
    narrator: NarratorHandle,
    config: watch::Receiver<VoiceConfig>,
    live_after: Instant,
}

impl ChatFeed {
    /// Create a feed that ignores messages for `grace` after creation.
    #[must_use]
    pub fn new(
        narrator: NarratorHandle,
        config: watch::Receiver<VoiceConfig>,
        grace: Duration,
    ) -> Self {
        Self {
            narrator,
            config,
            live_after: Instant::now() + grace,
        }
    }

    /// Apply one chat event.
    ///
    /// Fails only if the narrator has stopped.
    pub fn dispatch(&self, event: ChatEvent) -> Result<(), NarratorError> {
        match event {
            ChatEvent::MessageAdded {
                id,
                author,
                fragments,
            } => {
                if Instant::now() < self.live_after {
                    tracing::trace!(message = %id, "Ignoring backlog message");
                    return Ok(());
                }

                let emojis_enabled = self.config.borrow().emojis_enabled;
                let body = render_body(&fragments, emojis_enabled);
                if !has_speakable_text(&body) {
                    tracing::trace!(message = %id, "Nothing speakable in message");
                    return Ok(());
                }

                self.narrator.enqueue(id, author, body)
            }
            ChatEvent::MessageRenamed { old, new } => self.narrator.rename(old, new),
            ChatEvent::MessageDeleted { id } => self.narrator.remove(id),
            ChatEvent::DetachedChanged { detached } => self.narrator.set_detached(detached),
        }
    }
}
