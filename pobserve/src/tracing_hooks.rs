//! Tracing-based observability hooks for transport operations and session activity.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use psession::SessionHooks;
//!
//! fn accepts_session_hooks(_hooks: &dyn SessionHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_session_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::{MessageId, SessionId};
use psession::{Notice, NoticeLevel, SessionError, SessionHooks};
use ptransport::{Message, TransportError, TransportOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl TransportOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, session_id: &SessionId, attempt: u32) {
        tracing::info!(
            phase = "transport",
            event = "attempt_start",
            session_id = %session_id,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        session_id: &SessionId,
        attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        tracing::warn!(
            phase = "transport",
            event = "retry_scheduled",
            session_id = %session_id,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, operation: &str, session_id: &SessionId, attempts: u32) {
        tracing::info!(
            phase = "transport",
            event = "success",
            session_id = %session_id,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        operation: &str,
        session_id: &SessionId,
        attempts: u32,
        error: &TransportError,
    ) {
        tracing::error!(
            phase = "transport",
            event = "failure",
            session_id = %session_id,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl SessionHooks for TracingObservabilityHooks {
    fn on_session_changed(&self, previous: Option<&SessionId>, current: Option<&SessionId>) {
        tracing::info!(
            phase = "session",
            event = "session_changed",
            previous = previous.map(SessionId::as_str),
            current = current.map(SessionId::as_str)
        );
    }

    fn on_load_start(&self, session_id: &SessionId, before: Option<&MessageId>) {
        tracing::info!(
            phase = "history",
            event = "load_start",
            session_id = %session_id,
            before = before.map(MessageId::as_str)
        );
    }

    fn on_load_success(
        &self,
        session_id: &SessionId,
        received: usize,
        has_more: bool,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "history",
            event = "load_success",
            session_id = %session_id,
            received = received as u64,
            has_more,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_load_failure(&self, session_id: &SessionId, error: &SessionError, elapsed: Duration) {
        tracing::error!(
            phase = "history",
            event = "load_failure",
            session_id = %session_id,
            error_kind = ?error.kind,
            transport_kind = ?error.transport_kind,
            retryable = error.retryable,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error
        );
    }

    fn on_load_discarded(&self, session_id: &SessionId) {
        tracing::info!(phase = "history", event = "load_discarded", session_id = %session_id);
    }

    fn on_send_success(&self, session_id: &SessionId, message: &Message, elapsed: Duration) {
        tracing::info!(
            phase = "send",
            event = "send_success",
            session_id = %session_id,
            message_id = %message.id,
            attachments = message.attachments.len() as u64,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_send_failure(&self, session_id: &SessionId, error: &SessionError, elapsed: Duration) {
        tracing::error!(
            phase = "send",
            event = "send_failure",
            session_id = %session_id,
            error_kind = ?error.kind,
            transport_kind = ?error.transport_kind,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error
        );
    }

    fn on_push_message(&self, session_id: &SessionId, message: &Message, duplicate: bool) {
        tracing::debug!(
            phase = "push",
            event = "message",
            session_id = %session_id,
            message_id = %message.id,
            sender = %message.sender,
            duplicate
        );
    }

    fn on_push_disconnect(&self, session_id: &SessionId, error: Option<&TransportError>) {
        tracing::warn!(
            phase = "push",
            event = "disconnect",
            session_id = %session_id,
            error_kind = ?error.map(|error| error.kind),
            error = ?error.map(|error| error.message.as_str())
        );
    }

    fn on_typing_failure(&self, session_id: &SessionId, is_typing: bool, error: &TransportError) {
        tracing::warn!(
            phase = "typing",
            event = "typing_failure",
            session_id = %session_id,
            is_typing,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_notice(&self, notice: &Notice) {
        let session_id = notice.session_id.as_ref().map(SessionId::as_str);
        match notice.level {
            NoticeLevel::Info => {
                tracing::info!(phase = "notice", session_id, message = %notice.message)
            }
            NoticeLevel::Warning => {
                tracing::warn!(phase = "notice", session_id, message = %notice.message)
            }
            NoticeLevel::Error => {
                tracing::error!(phase = "notice", session_id, message = %notice.message)
            }
        }
    }
}
