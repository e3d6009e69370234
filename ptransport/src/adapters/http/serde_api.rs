//! Chat backend HTTP and push-frame payload models and conversion helpers.

use std::time::{Duration, UNIX_EPOCH};

use pcommon::SessionId;
use serde::{Deserialize, Serialize};

use crate::{
    Attachment, MediaMetadata, Message, MessageStatus, OutgoingMessage, Sender, TransportError,
    TypingEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ApiSender {
    User,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ApiStatus {
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ApiMediaMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ApiAttachment {
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ApiMediaMetadata>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiMessage {
    pub id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub content: String,
    pub sender: ApiSender,
    /// Epoch milliseconds.
    pub timestamp: u64,
    #[serde(default)]
    pub status: Option<ApiStatus>,
    #[serde(default)]
    pub attachments: Vec<ApiAttachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiHistoryResponse {
    pub messages: Vec<ApiMessage>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiSendRequest {
    pub content: String,
    pub attachments: Vec<ApiAttachment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiTypingRequest {
    pub is_typing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ApiPushFrame {
    Message {
        message: ApiMessage,
    },
    Typing {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) enum PushFrame {
    Message(Message),
    Typing(TypingEvent),
}

pub(crate) fn parse_push_frame(
    payload: &str,
    session_id: &SessionId,
) -> Result<PushFrame, TransportError> {
    let frame: ApiPushFrame = serde_json::from_str(payload)
        .map_err(|err| TransportError::protocol(format!("invalid push frame: {err}")))?;

    Ok(match frame {
        ApiPushFrame::Message { message } => PushFrame::Message(message.into_message(session_id)),
        ApiPushFrame::Typing { user_id, is_typing } => {
            PushFrame::Typing(TypingEvent::new(user_id, is_typing))
        }
    })
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    parsed.error.or(parsed.message)
}

impl ApiMessage {
    pub(crate) fn into_message(self, session_id: &SessionId) -> Message {
        let session_id = self
            .session_id
            .map(SessionId::from)
            .unwrap_or_else(|| session_id.clone());

        Message {
            id: self.id.into(),
            session_id,
            content: self.content,
            sender: self.sender.into(),
            timestamp: UNIX_EPOCH + Duration::from_millis(self.timestamp),
            status: self.status.map(MessageStatus::from),
            attachments: self.attachments.into_iter().map(Attachment::from).collect(),
        }
    }
}

impl From<&OutgoingMessage> for ApiSendRequest {
    fn from(value: &OutgoingMessage) -> Self {
        Self {
            content: value.content.clone(),
            attachments: value.attachments.iter().map(ApiAttachment::from).collect(),
        }
    }
}

impl From<ApiSender> for Sender {
    fn from(value: ApiSender) -> Self {
        match value {
            ApiSender::User => Sender::User,
            ApiSender::Support => Sender::Support,
        }
    }
}

impl From<ApiStatus> for MessageStatus {
    fn from(value: ApiStatus) -> Self {
        match value {
            ApiStatus::Sending => MessageStatus::Sending,
            ApiStatus::Sent => MessageStatus::Sent,
            ApiStatus::Delivered => MessageStatus::Delivered,
            ApiStatus::Read => MessageStatus::Read,
            ApiStatus::Failed => MessageStatus::Failed,
        }
    }
}

impl From<ApiAttachment> for Attachment {
    fn from(value: ApiAttachment) -> Self {
        Self {
            url: value.url,
            content_type: value.content_type,
            name: value.name,
            size: value.size,
            media: value.metadata.map(|metadata| MediaMetadata {
                width: metadata.width,
                height: metadata.height,
                duration: metadata.duration.map(Duration::from_millis),
            }),
        }
    }
}

impl From<&Attachment> for ApiAttachment {
    fn from(value: &Attachment) -> Self {
        Self {
            url: value.url.clone(),
            content_type: value.content_type.clone(),
            name: value.name.clone(),
            size: value.size,
            metadata: value.media.map(|media| ApiMediaMetadata {
                width: media.width,
                height: media.height,
                duration: media.duration.map(|duration| duration.as_millis() as u64),
            }),
        }
    }
}
