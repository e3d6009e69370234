//! Metrics-based observability hooks for transport operations and session activity.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use ptransport::TransportOperationHooks;
//!
//! fn accepts_transport_hooks(_hooks: &dyn TransportOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_transport_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::SessionId;
use psession::{Notice, SessionError, SessionHooks};
use ptransport::{Message, TransportError, TransportOperationHooks};

/// Emits `parley_*` counters and histograms. Session ids are never used as labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl TransportOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, _session_id: &SessionId, _attempt: u32) {
        metrics::counter!(
            "parley_transport_attempt_start_total",
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        _session_id: &SessionId,
        _attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        metrics::counter!(
            "parley_transport_retry_scheduled_total",
            "operation" => operation.to_string(),
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "parley_transport_retry_delay_seconds",
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, operation: &str, _session_id: &SessionId, attempts: u32) {
        metrics::counter!(
            "parley_transport_success_total",
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "parley_transport_attempts_per_success",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        operation: &str,
        _session_id: &SessionId,
        attempts: u32,
        error: &TransportError,
    ) {
        metrics::counter!(
            "parley_transport_failure_total",
            "operation" => operation.to_string(),
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "parley_transport_attempts_per_failure",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl SessionHooks for MetricsObservabilityHooks {
    fn on_session_changed(&self, _previous: Option<&SessionId>, current: Option<&SessionId>) {
        let target = if current.is_some() { "session" } else { "none" };
        metrics::counter!("parley_session_changed_total", "target" => target).increment(1);
    }

    fn on_load_success(
        &self,
        _session_id: &SessionId,
        received: usize,
        has_more: bool,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_history_load_total",
            "status" => "success",
            "has_more" => has_more.to_string()
        )
        .increment(1);
        metrics::counter!("parley_history_messages_received_total").increment(received as u64);
        metrics::histogram!("parley_history_load_duration_seconds", "status" => "success")
            .record(elapsed.as_secs_f64());
    }

    fn on_load_failure(&self, _session_id: &SessionId, error: &SessionError, elapsed: Duration) {
        metrics::counter!(
            "parley_history_load_total",
            "status" => "failure",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("parley_history_load_duration_seconds", "status" => "failure")
            .record(elapsed.as_secs_f64());
    }

    fn on_load_discarded(&self, _session_id: &SessionId) {
        metrics::counter!("parley_history_load_total", "status" => "discarded").increment(1);
    }

    fn on_send_success(&self, _session_id: &SessionId, message: &Message, elapsed: Duration) {
        let kind = if message.attachments.is_empty() {
            "text"
        } else {
            "attachment"
        };
        metrics::counter!("parley_send_total", "status" => "success", "kind" => kind).increment(1);
        metrics::histogram!("parley_send_duration_seconds", "status" => "success")
            .record(elapsed.as_secs_f64());
    }

    fn on_send_failure(&self, _session_id: &SessionId, error: &SessionError, elapsed: Duration) {
        metrics::counter!(
            "parley_send_total",
            "status" => "failure",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("parley_send_duration_seconds", "status" => "failure")
            .record(elapsed.as_secs_f64());
    }

    fn on_push_message(&self, _session_id: &SessionId, message: &Message, duplicate: bool) {
        metrics::counter!(
            "parley_push_message_total",
            "sender" => message.sender.to_string(),
            "duplicate" => duplicate.to_string()
        )
        .increment(1);
    }

    fn on_push_disconnect(&self, _session_id: &SessionId, error: Option<&TransportError>) {
        let cause = error.map_or("closed", |error| error.kind.as_str());
        metrics::counter!("parley_push_disconnect_total", "cause" => cause).increment(1);
    }

    fn on_typing_failure(&self, _session_id: &SessionId, is_typing: bool, error: &TransportError) {
        metrics::counter!(
            "parley_typing_failure_total",
            "is_typing" => is_typing.to_string(),
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
    }

    fn on_notice(&self, notice: &Notice) {
        metrics::counter!("parley_notice_total", "level" => format!("{:?}", notice.level))
            .increment(1);
    }
}
