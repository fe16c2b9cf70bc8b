//! Pending-message queue, an insertion-ordered map from [`MessageId`] to message.
//!
//! Chat volumes are small (tens of pending messages at most), so entries live
//! in a `VecDeque` and lookups are linear. Keys are unique: inserting an id
//! that is already queued is refused, and renames migrate a key in place
//! without changing its position.

use std::collections::VecDeque;

use chatspeak_core::{ChatMessage, MessageId};

/// FIFO queue of messages waiting to be spoken.
#[derive(Debug, Default)]
pub struct MessageQueue {
    entries: VecDeque<ChatMessage>,
}

impl MessageQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` at the tail.
    ///
    /// Returns `false` (and leaves the existing entry untouched) if a message
    /// with the same id is already queued.
    pub fn insert(&mut self, message: ChatMessage) -> bool {
        if self.contains(&message.id) {
            return false;
        }
        self.entries.push_back(message);
        true
    }

    /// Whether `id` is queued.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.position(id).is_some()
    }

    /// Oldest queued message.
    #[must_use]
    pub fn front(&self) -> Option<&ChatMessage> {
        self.entries.front()
    }

    /// Migrate the entry keyed `old` to `new`, keeping its queue position.
    ///
    /// Returns `false` if `old` is not queued. If `new` is already queued the
    /// entry under `old` is dropped instead, so a rename never leaves two live
    /// entries for one message.
    pub fn rename(&mut self, old: &MessageId, new: MessageId) -> bool {
        let Some(pos) = self.position(old) else {
            return false;
        };
        if *old == new {
            return true;
        }
        if self.contains(&new) {
            self.entries.remove(pos);
        } else {
            self.entries[pos].id = new;
        }
        true
    }

    /// Remove and return the entry for `id`.
    pub fn remove(&mut self, id: &MessageId) -> Option<ChatMessage> {
        let pos = self.position(id)?;
        self.entries.remove(pos)
    }

    /// Drop every entry, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Ids in queue order.
    #[must_use]
    pub fn ids(&self) -> Vec<MessageId> {
        self.entries.iter().map(|m| m.id.clone()).collect()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.entries.iter().position(|m| &m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(queue: &MessageQueue) -> Vec<&str> {
        queue.entries.iter().map(|m| m.id.as_str()).collect()
    }

    fn entry<'a>(queue: &'a MessageQueue, id: &str) -> &'a ChatMessage {
        queue.entries.iter().find(|m| m.id.as_str() == id).unwrap()
    }

    fn queue_of(ids: &[&str]) -> MessageQueue {
        let mut queue = MessageQueue::new();
        for id in ids {
            queue.insert(ChatMessage::new(*id, "author", format!("body {id}")));
        }
        queue
    }

    #[test]
    fn insert_keeps_fifo_order() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_eq!(ids(&queue), ["a", "b", "c"]);
        assert_eq!(queue.front().map(|m| m.id.as_str()), Some("a"));
    }

    #[test]
    fn duplicate_insert_keeps_first_entry() {
        let mut queue = MessageQueue::new();
        assert!(queue.insert(ChatMessage::new("a", "Alice", "first")));
        assert!(!queue.insert(ChatMessage::new("a", "Mallory", "second")));

        assert_eq!(queue.len(), 1);
        let first = entry(&queue, "a");
        assert_eq!(first.author, "Alice");
        assert_eq!(first.body, "first");
    }

    #[test]
    fn rename_preserves_position_and_value() {
        let mut queue = queue_of(&["a", "tmp", "c"]);
        assert!(queue.rename(&"tmp".into(), "b".into()));

        assert_eq!(ids(&queue), ["a", "b", "c"]);
        assert_eq!(entry(&queue, "b").body, "body tmp");
        assert!(!queue.contains(&"tmp".into()));
    }

    #[test]
    fn rename_of_missing_id_is_ignored() {
        let mut queue = queue_of(&["a"]);
        assert!(!queue.rename(&"gone".into(), "b".into()));
        assert_eq!(ids(&queue), ["a"]);
    }

    #[test]
    fn rename_onto_existing_id_collapses_entries() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert!(queue.rename(&"c".into(), "a".into()));

        assert_eq!(ids(&queue), ["a", "b"]);
        assert_eq!(entry(&queue, "a").body, "body a");
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let removed = queue.remove(&"b".into()).unwrap();

        assert_eq!(removed.id.as_str(), "b");
        assert_eq!(ids(&queue), ["a", "c"]);
        assert!(queue.remove(&"b".into()).is_none());
    }

    #[test]
    fn clear_reports_count() {
        let mut queue = queue_of(&["a", "b"]);
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
