//! Transport contract, message model and transport adapters for support chat sessions.
//!
//! ```rust
//! use ptransport::{Message, MessageStatus, Sender};
//!
//! let message = Message::new("srv-1", "s1", Sender::Support, "How can we help?")
//!     .with_status(MessageStatus::Delivered);
//!
//! assert_eq!(message.id.as_str(), "srv-1");
//! assert_eq!(message.status, Some(MessageStatus::Delivered));
//! ```

use std::time::{Duration, SystemTime};

use pcommon::{MessageId, SessionId, UserId};

mod credentials;
mod error;
mod memory;
mod resilience;
mod subscription;
mod transport;

pub mod adapters;
pub mod prelude;

pub use credentials::SecretString;
pub use error::{TransportError, TransportErrorKind};
pub use memory::{InMemoryTransport, TransportCall};
pub use pcommon::BoxFuture;
pub use resilience::{
    Backoff, NoopOperationHooks, RetryPolicy, TransportOperationHooks, execute_with_retry,
};
pub use subscription::{PushGate, Subscription};
pub use transport::{ChatTransport, PushHandler, TransportFuture};

#[cfg(feature = "http")]
pub use adapters::http::{HttpTransport, HttpTransportConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    User,
    Support,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sender = match self {
            Self::User => "user",
            Self::Support => "support",
        };

        f.write_str(sender)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub content_type: String,
    pub name: String,
    pub size: u64,
    pub media: Option<MediaMetadata>,
}

impl Attachment {
    pub fn new(
        url: impl Into<String>,
        content_type: impl Into<String>,
        name: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
            name: name.into(),
            size,
            media: None,
        }
    }

    pub fn with_media(mut self, media: MediaMetadata) -> Self {
        self.media = Some(media);
        self
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: SystemTime,
    pub status: Option<MessageStatus>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        session_id: impl Into<SessionId>,
        sender: Sender,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            content: content.into(),
            sender,
            timestamp: SystemTime::now(),
            status: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEvent {
    pub user_id: UserId,
    pub is_typing: bool,
}

impl TypingEvent {
    pub fn new(user_id: impl Into<UserId>, is_typing: bool) -> Self {
        Self {
            user_id: user_id.into(),
            is_typing,
        }
    }
}

/// Page request for history. `before` selects messages strictly older than the given id;
/// `None` selects the newest page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub before: Option<MessageId>,
    pub limit: usize,
}

impl HistoryQuery {
    pub fn latest(limit: usize) -> Self {
        Self {
            before: None,
            limit,
        }
    }

    pub fn before(id: impl Into<MessageId>, limit: usize) -> Self {
        Self {
            before: Some(id.into()),
            limit,
        }
    }
}

/// One page of history, ordered oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    pub fn new(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            content: content.into(),
            attachments,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, Vec::new())
    }

    pub fn validate(&self) -> Result<(), TransportError> {
        if self.content.trim().is_empty() && self.attachments.is_empty() {
            return Err(TransportError::validation(
                "message requires content or at least one attachment",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_message_requires_content_or_attachment() {
        let blank = OutgoingMessage::text("   ");
        let error = blank.validate().expect_err("blank message should fail");
        assert_eq!(error.kind, TransportErrorKind::Validation);
        assert!(!error.retryable);

        let attachment_only = OutgoingMessage::new(
            "",
            vec![Attachment::new("https://cdn.test/a.png", "image/png", "a.png", 42)],
        );
        assert!(attachment_only.validate().is_ok());
    }

    #[test]
    fn history_query_constructors_set_cursor() {
        assert_eq!(HistoryQuery::latest(20).before, None);
        assert_eq!(
            HistoryQuery::before("srv-3", 10).before,
            Some(MessageId::from("srv-3"))
        );
    }

    #[test]
    fn attachment_media_detection_uses_mime_prefix() {
        let image = Attachment::new("u", "image/jpeg", "photo.jpg", 1).with_media(MediaMetadata {
            width: Some(640),
            height: Some(480),
            duration: None,
        });
        assert!(image.is_image());
        assert!(!Attachment::new("u", "application/pdf", "doc.pdf", 1).is_image());
    }
}
