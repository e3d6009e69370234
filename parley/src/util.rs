//! Small convenience constructors for common types.

use crate::{
    Attachment, ChatSession, MediaMetadata, Message, MessageStatus, Sender, SessionId,
    TypingEvent, UserId,
};

pub fn user_message(
    session_id: impl Into<SessionId>,
    id: impl Into<crate::MessageId>,
    content: impl Into<String>,
) -> Message {
    Message::new(id, session_id, Sender::User, content).with_status(MessageStatus::Delivered)
}

pub fn support_message(
    session_id: impl Into<SessionId>,
    id: impl Into<crate::MessageId>,
    content: impl Into<String>,
) -> Message {
    Message::new(id, session_id, Sender::Support, content).with_status(MessageStatus::Delivered)
}

pub fn active_session(id: impl Into<SessionId>) -> ChatSession {
    ChatSession::new(id)
}

pub fn typing_event(user_id: impl Into<UserId>, is_typing: bool) -> TypingEvent {
    TypingEvent::new(user_id, is_typing)
}

/// Attachment whose name is the last path segment of `url`.
pub fn attachment(
    url: impl Into<String>,
    content_type: impl Into<String>,
    size: u64,
) -> Attachment {
    let url = url.into();
    let name = url
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("attachment")
        .to_string();
    Attachment::new(url, content_type, name, size)
}

pub fn image_attachment(
    url: impl Into<String>,
    content_type: impl Into<String>,
    size: u64,
    width: u32,
    height: u32,
) -> Attachment {
    attachment(url, content_type, size).with_media(MediaMetadata {
        width: Some(width),
        height: Some(height),
        duration: None,
    })
}

#[cfg(test)]
mod tests {
    use crate::{Sender, SessionStatus};

    use super::{active_session, attachment, image_attachment, support_message};

    #[test]
    fn attachment_name_comes_from_url() {
        let invoice = attachment("https://cdn.test/files/invoice.pdf", "application/pdf", 10);
        assert_eq!(invoice.name, "invoice.pdf");

        let unnamed = attachment("https://cdn.test/", "application/pdf", 10);
        assert_eq!(unnamed.name, "attachment");

        let image = image_attachment("https://cdn.test/p.png", "image/png", 99, 640, 480);
        assert!(image.is_image());
        assert_eq!(image.media.and_then(|media| media.width), Some(640));
    }

    #[test]
    fn message_and_session_helpers_apply_expected_defaults() {
        let message = support_message("s1", "srv-1", "hello");
        assert_eq!(message.sender, Sender::Support);

        let session = active_session("s1");
        assert_eq!(session.status, SessionStatus::Active);
    }
}
