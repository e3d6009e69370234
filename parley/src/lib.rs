//! Unified facade over the parley workspace crates.
//!
//! This crate is the single dependency for most chat widgets. It re-exports the
//! session, transport and observability crates and adds wiring helpers and macros
//! for common setup flows.

mod macros;

pub mod prelude;
pub mod runtime;
pub mod util;

pub use pcommon;
pub use pobserve;
pub use psession;
pub use ptransport;

pub use pcommon::{BoxFuture, MessageId, SessionId, UserId};
pub use pobserve::{
    MetricsObservabilityHooks, SafeSessionHooks, SafeTransportHooks, TracingObservabilityHooks,
};
pub use psession::{
    ChatSession, LoadOutcome, NoopSessionHooks, Notice, NoticeLevel, SessionConfig,
    SessionController, SessionControllerBuilder, SessionError, SessionErrorKind, SessionHooks,
    SessionPriority, SessionSnapshot, SessionStatus, SessionStore, SkipReason, SnapshotStream,
};
pub use ptransport::{
    Attachment, Backoff, ChatTransport, HistoryQuery, InMemoryTransport, MediaMetadata, Message,
    MessagePage, MessageStatus, NoopOperationHooks, OutgoingMessage, PushGate, PushHandler,
    RetryPolicy, SecretString, Sender, Subscription, TransportCall, TransportError,
    TransportErrorKind, TransportFuture, TransportOperationHooks, TypingEvent, execute_with_retry,
};

#[cfg(feature = "http")]
pub use ptransport::{HttpTransport, HttpTransportConfig};

pub use runtime::{
    controller_from_env, in_memory_controller, metered_controller, observed_controller,
    session_controller,
};
#[cfg(feature = "http")]
pub use runtime::{http_controller, http_transport};
pub use util::{
    active_session, attachment, image_attachment, support_message, typing_event, user_message,
};

#[cfg(test)]
mod tests {
    use crate::{MessageStatus, Sender, SessionPriority};

    #[test]
    fn parley_msg_macro_creates_expected_message() {
        let message = crate::parley_msg!(support, "s1", "srv-1" => "How can we help?");
        assert_eq!(message.sender, Sender::Support);
        assert_eq!(message.session_id.as_str(), "s1");
        assert_eq!(message.content, "How can we help?");
    }

    #[test]
    fn parley_history_macro_builds_ordered_page() {
        let messages = crate::parley_history!("s1";
            support "srv-1" => "Hello!",
            user "srv-2" => "My order is late",
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::Support);
        assert_eq!(messages[1].sender, Sender::User);
        assert!(messages.iter().all(|message| message.status == Some(MessageStatus::Delivered)));
    }

    #[test]
    fn parley_session_macro_supports_priority_and_tags() {
        let session = crate::parley_session!("s1", urgent, ["billing", "vip"]);
        assert_eq!(session.priority, SessionPriority::Urgent);
        assert_eq!(session.tags, vec!["billing", "vip"]);
        assert!(session.is_active());
    }
}
