use std::sync::Arc;

use pcommon::{BoxFuture, SessionId};

use crate::{
    HistoryQuery, Message, MessagePage, OutgoingMessage, Subscription, TransportError,
    TypingEvent,
};

pub type TransportFuture<'a, T> = BoxFuture<'a, T>;

/// Receiver for events pushed by the live channel of one session.
pub trait PushHandler: Send + Sync {
    fn on_message(&self, message: Message);

    fn on_typing(&self, event: TypingEvent);

    /// The channel closed without being unsubscribed.
    fn on_disconnect(&self, _error: Option<TransportError>) {}
}

/// Boundary to the chat backend for a support conversation.
///
/// Contract for implementers:
/// - `fetch_messages` returns a page ordered oldest first.
/// - `send_message` returns the persisted, server-assigned message.
/// - `send_typing_event` is best effort; callers log failures and move on.
/// - After `Subscription::unsubscribe` returns, the handler passed to `subscribe`
///   must never be invoked again. [`PushGate`](crate::PushGate) implements this.
pub trait ChatTransport: Send + Sync {
    fn fetch_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
        query: HistoryQuery,
    ) -> TransportFuture<'a, Result<MessagePage, TransportError>>;

    fn send_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        message: OutgoingMessage,
    ) -> TransportFuture<'a, Result<Message, TransportError>>;

    fn send_typing_event<'a>(
        &'a self,
        session_id: &'a SessionId,
        is_typing: bool,
    ) -> TransportFuture<'a, Result<(), TransportError>>;

    fn subscribe(
        &self,
        session_id: &SessionId,
        handler: Arc<dyn PushHandler>,
    ) -> Result<Subscription, TransportError>;
}
