//! In-memory state for the active chat session.
//!
//! ```rust
//! use psession::SessionStore;
//! use ptransport::{Message, Sender};
//!
//! let mut store = SessionStore::new();
//! store.append_message(Message::new("srv-2", "s1", Sender::User, "second"));
//! store.prepend_messages(vec![Message::new("srv-1", "s1", Sender::Support, "first")], false);
//!
//! let ids: Vec<_> = store.messages().iter().map(|m| m.id.as_str()).collect();
//! assert_eq!(ids, vec!["srv-1", "srv-2"]);
//! assert!(!store.has_more());
//! ```

use pcommon::{MessageId, SessionId};
use ptransport::{Message, MessageStatus};

use crate::{SessionError, SessionSnapshot};

/// Message list and status flags for exactly one session.
///
/// Mutations are plain state transitions. The store never merges or de-duplicates;
/// callers check [`SessionStore::contains`] before appending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    messages: Vec<Message>,
    is_typing: bool,
    is_loading: bool,
    has_more: bool,
    error: Option<SessionError>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            is_typing: false,
            is_loading: false,
            has_more: true,
            error: None,
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn prepend_messages(&mut self, messages: Vec<Message>, has_more: bool) {
        self.messages.splice(0..0, messages);
        self.has_more = has_more;
    }

    pub fn set_typing(&mut self, is_typing: bool) {
        self.is_typing = is_typing;
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    pub fn set_error(&mut self, error: SessionError) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replaces the message with `id` in place. Returns `false` when absent.
    pub fn replace_message(&mut self, id: &MessageId, message: Message) -> bool {
        match self.position(id) {
            Some(index) => {
                self.messages[index] = message;
                true
            }
            None => false,
        }
    }

    pub fn remove_message(&mut self, id: &MessageId) -> Option<Message> {
        self.position(id).map(|index| self.messages.remove(index))
    }

    pub fn set_status(&mut self, id: &MessageId, status: MessageStatus) -> bool {
        match self.position(id) {
            Some(index) => {
                self.messages[index].status = Some(status);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.position(id).is_some()
    }

    /// Cursor for the next history page: the oldest server-confirmed message.
    pub fn earliest_id(&self) -> Option<&MessageId> {
        self.messages
            .iter()
            .find(|message| !message.is_provisional())
            .map(|message| &message.id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn snapshot(&self, session_id: Option<SessionId>) -> SessionSnapshot {
        SessionSnapshot {
            session_id,
            messages: self.messages.clone(),
            is_typing: self.is_typing,
            is_loading: self.is_loading,
            has_more: self.has_more,
            error: self.error.clone(),
        }
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|message| &message.id == id)
    }
}

#[cfg(test)]
mod tests {
    use ptransport::Sender;

    use super::*;

    fn message(id: &str) -> Message {
        Message::new(id, "s1", Sender::Support, format!("body {id}"))
    }

    #[test]
    fn reset_restores_initial_state_and_is_idempotent() {
        let mut store = SessionStore::new();
        store.append_message(message("srv-1"));
        store.set_typing(true);
        store.set_loading(true);
        store.prepend_messages(Vec::new(), false);
        store.set_error(SessionError::runtime("boom"));

        store.reset();
        let once = store.clone();
        store.reset();

        assert_eq!(store, once);
        assert!(store.messages().is_empty());
        assert!(!store.is_typing());
        assert!(!store.is_loading());
        assert!(store.has_more());
        assert!(store.error().is_none());
    }

    #[test]
    fn append_does_not_merge_duplicates() {
        let mut store = SessionStore::new();
        store.append_message(message("srv-1"));
        store.append_message(message("srv-1"));

        assert_eq!(store.messages().len(), 2);
    }

    #[test]
    fn replace_keeps_position_and_status_moves_in_place() {
        let mut store = SessionStore::new();
        store.append_message(message("srv-1"));
        store.append_message(
            Message::new(MessageId::provisional(1), "s1", Sender::User, "hi")
                .with_status(MessageStatus::Sending),
        );
        store.append_message(message("srv-2"));

        let provisional = MessageId::provisional(1);
        assert!(store.replace_message(&provisional, message("srv-9")));
        assert_eq!(store.messages()[1].id.as_str(), "srv-9");
        assert!(!store.contains(&provisional));

        assert!(store.set_status(&MessageId::from("srv-9"), MessageStatus::Read));
        assert_eq!(store.messages()[1].status, Some(MessageStatus::Read));
        assert!(!store.set_status(&provisional, MessageStatus::Failed));
    }

    #[test]
    fn earliest_id_skips_provisional_messages() {
        let mut store = SessionStore::new();
        assert_eq!(store.earliest_id(), None);

        store.append_message(Message::new(MessageId::provisional(1), "s1", Sender::User, "x"));
        assert_eq!(store.earliest_id(), None);

        store.prepend_messages(vec![message("srv-4"), message("srv-5")], true);
        assert_eq!(store.earliest_id(), Some(&MessageId::from("srv-4")));

        let removed = store.remove_message(&MessageId::from("srv-4"));
        assert!(removed.is_some());
        assert_eq!(store.earliest_id(), Some(&MessageId::from("srv-5")));
    }
}
