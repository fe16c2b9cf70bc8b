//! Chat message domain types.
//!
//! A chat message is identified by an opaque [`MessageId`] assigned by the chat
//! surface. Ids are not stable: the surface may hand out a temporary id for a
//! message and rename it later, so nothing in this crate assumes a format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a raw id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A message waiting to be spoken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Current identity of the message (may be migrated by a rename).
    pub id: MessageId,
    /// Display name of the author.
    pub author: String,
    /// Message text, already emoji-expanded (or not) per configuration.
    pub body: String,
}

impl ChatMessage {
    /// Create a new chat message.
    pub fn new(
        id: impl Into<MessageId>,
        author: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            body: body.into(),
        }
    }

    /// The text handed to the speech engine: `{author}: "{body}"`.
    #[must_use]
    pub fn utterance_text(&self) -> String {
        format!("{}: \"{}\"", self.author, self.body)
    }
}

/// One piece of a rendered chat message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MessageFragment {
    /// Plain text run.
    Text { text: String },
    /// A mention of another user (read as its visible text).
    Mention { text: String },
    /// An emoji image, carrying its alternative text.
    Emoji { alt: String },
}

impl MessageFragment {
    /// Plain text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Mention fragment.
    pub fn mention(text: impl Into<String>) -> Self {
        Self::Mention { text: text.into() }
    }

    /// Emoji fragment.
    pub fn emoji(alt: impl Into<String>) -> Self {
        Self::Emoji { alt: alt.into() }
    }
}

/// Flatten message fragments into the body text that gets spoken.
///
/// With emojis enabled each emoji contributes its alt text plus a trailing
/// space, otherwise engines run consecutive emoji names together. With emojis
/// disabled emoji fragments contribute nothing.
#[must_use]
pub fn render_body(fragments: &[MessageFragment], emojis_enabled: bool) -> String {
    let mut body = String::new();
    for fragment in fragments {
        match fragment {
            MessageFragment::Text { text } | MessageFragment::Mention { text } => {
                body.push_str(text);
            }
            MessageFragment::Emoji { alt } if emojis_enabled => {
                body.push_str(alt);
                body.push(' ');
            }
            MessageFragment::Emoji { .. } => {}
        }
    }
    body
}

/// Whether a body contains anything worth speaking.
#[must_use]
pub fn has_speakable_text(body: &str) -> bool {
    body.chars().any(|c| !c.is_whitespace())
}
