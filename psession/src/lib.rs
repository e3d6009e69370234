//! Session store and controller for a single support chat conversation.

mod config;
mod controller;
mod error;
mod hooks;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatSession, LoadOutcome, NoopSessionHooks, Notice, NoticeLevel, SessionConfig,
        SessionController, SessionControllerBuilder, SessionError, SessionErrorKind,
        SessionHooks, SessionPriority, SessionSnapshot, SessionStatus, SessionStore, SkipReason,
    };
    pub use pcommon::{MessageId, SessionId, UserId};
    pub use ptransport::{Attachment, ChatTransport, Message, MessageStatus, Sender};
}

pub use config::{
    ENV_FETCH_MAX_ATTEMPTS, ENV_LOCAL_USER_ID, ENV_OPTIMISTIC_SENDS, ENV_PAGE_SIZE,
    ENV_REMOTE_TYPING_TIMEOUT_MS, ENV_TYPING_TIMEOUT_MS, SessionConfig,
};
pub use controller::{SessionController, SessionControllerBuilder};
pub use error::{SessionError, SessionErrorKind};
pub use hooks::{NoopSessionHooks, SessionHooks};
pub use pcommon::{MessageId, SessionId, UserId};
pub use store::SessionStore;
pub use types::{
    ChatSession, LoadOutcome, Notice, NoticeLevel, SessionPriority, SessionSnapshot,
    SessionStatus, SkipReason, SnapshotStream,
};
