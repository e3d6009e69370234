//! Common imports for transport implementers.

pub use crate::{
    Attachment, Backoff, ChatTransport, HistoryQuery, InMemoryTransport, MediaMetadata, Message,
    MessagePage, MessageStatus, OutgoingMessage, PushGate, PushHandler, RetryPolicy, Sender,
    Subscription, TransportError, TransportErrorKind, TransportFuture, TransportOperationHooks,
    TypingEvent,
};
pub use pcommon::{MessageId, SessionId, UserId};
