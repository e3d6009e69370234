//! Focused unit tests for the HTTP transport internals.

#![cfg(test)]

use std::time::{Duration, UNIX_EPOCH};

use pcommon::SessionId;
use reqwest::StatusCode;

use crate::{Attachment, MessageStatus, OutgoingMessage, Sender, TransportErrorKind};

use super::serde_api::{ApiSendRequest, PushFrame, extract_error_message, parse_push_frame};
use super::{HttpTransportConfig, error_for_status, join_url};

#[test]
fn message_frame_maps_to_domain_message() {
    let payload = r#"{
        "type": "message",
        "message": {
            "id": "srv-9",
            "content": "hello",
            "sender": "support",
            "timestamp": 1700000000000,
            "status": "delivered",
            "attachments": [
                {"url": "https://cdn.test/a.png", "type": "image/png", "name": "a.png", "size": 2048,
                 "metadata": {"width": 10, "height": 20}}
            ]
        }
    }"#;

    let frame = parse_push_frame(payload, &SessionId::from("s1")).expect("frame should parse");
    let PushFrame::Message(message) = frame else {
        panic!("expected message frame");
    };

    assert_eq!(message.id.as_str(), "srv-9");
    assert_eq!(message.session_id.as_str(), "s1");
    assert_eq!(message.sender, Sender::Support);
    assert_eq!(message.status, Some(MessageStatus::Delivered));
    assert_eq!(
        message.timestamp,
        UNIX_EPOCH + Duration::from_millis(1_700_000_000_000)
    );
    assert_eq!(message.attachments.len(), 1);
    assert!(message.attachments[0].is_image());
    assert_eq!(
        message.attachments[0].media.and_then(|media| media.width),
        Some(10)
    );
}

#[test]
fn typing_frame_maps_to_typing_event() {
    let payload = r#"{"type":"typing","userId":"agent-7","isTyping":true}"#;

    let frame = parse_push_frame(payload, &SessionId::from("s1")).expect("frame should parse");
    let PushFrame::Typing(event) = frame else {
        panic!("expected typing frame");
    };

    assert_eq!(event.user_id.as_str(), "agent-7");
    assert!(event.is_typing);
}

#[test]
fn unknown_frame_is_a_protocol_error() {
    let error = parse_push_frame(r#"{"type":"presence"}"#, &SessionId::from("s1"))
        .err()
        .expect("unknown frame should fail");
    assert_eq!(error.kind, TransportErrorKind::Protocol);
}

#[test]
fn send_request_serializes_attachment_type_field() {
    let outgoing = OutgoingMessage::new(
        "",
        vec![Attachment::new("https://cdn.test/doc.pdf", "application/pdf", "doc.pdf", 99)],
    );

    let json = serde_json::to_value(ApiSendRequest::from(&outgoing)).expect("serialize");
    assert_eq!(json["content"], "");
    assert_eq!(json["attachments"][0]["type"], "application/pdf");
    assert!(json["attachments"][0].get("metadata").is_none());
}

#[test]
fn status_codes_map_to_error_kinds() {
    let cases = [
        (StatusCode::UNAUTHORIZED, TransportErrorKind::Authentication),
        (StatusCode::TOO_MANY_REQUESTS, TransportErrorKind::RateLimited),
        (StatusCode::GATEWAY_TIMEOUT, TransportErrorKind::Timeout),
        (StatusCode::UNPROCESSABLE_ENTITY, TransportErrorKind::Validation),
        (StatusCode::BAD_GATEWAY, TransportErrorKind::Unavailable),
        (StatusCode::INTERNAL_SERVER_ERROR, TransportErrorKind::Network),
    ];

    for (status, kind) in cases {
        assert_eq!(error_for_status(status, "x".to_string()).kind, kind);
    }
}

#[test]
fn error_body_prefers_error_then_message_field() {
    assert_eq!(
        extract_error_message(r#"{"error":"session closed"}"#).as_deref(),
        Some("session closed")
    );
    assert_eq!(
        extract_error_message(r#"{"message":"bad cursor"}"#).as_deref(),
        Some("bad cursor")
    );
    assert_eq!(extract_error_message("<html>"), None);
}

#[test]
fn urls_join_without_duplicate_slashes() {
    assert_eq!(
        join_url("https://api.test/chat/", "sessions/s1/messages"),
        "https://api.test/chat/sessions/s1/messages"
    );

    let config = HttpTransportConfig::new("https://api.test", "wss://push.test")
        .with_token("tok")
        .with_request_timeout(Duration::from_secs(3));
    assert_eq!(format!("{:?}", config.token), "Some([REDACTED])");
    assert_eq!(config.request_timeout, Duration::from_secs(3));
}
