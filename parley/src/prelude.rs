//! Common imports for most parley applications.

pub use crate::{
    active_session, attachment, controller_from_env, image_attachment, in_memory_controller,
    metered_controller, observed_controller, session_controller, support_message, typing_event,
    user_message,
};
pub use crate::{parley_history, parley_msg, parley_session};
pub use crate::{
    Attachment, ChatSession, ChatTransport, InMemoryTransport, LoadOutcome, Message, MessageId,
    MessageStatus, Notice, NoticeLevel, RetryPolicy, Sender, SessionConfig, SessionController,
    SessionError, SessionErrorKind, SessionHooks, SessionId, SessionSnapshot, SkipReason,
    TransportError, TransportErrorKind, UserId,
};

#[cfg(feature = "http")]
pub use crate::{HttpTransport, HttpTransportConfig, http_controller, http_transport};
