use std::sync::{Arc, Mutex};
use std::time::Duration;

use pcommon::{MessageId, SessionId};
use psession::{
    Notice, NoticeLevel, SessionConfig, SessionController, SessionError, SessionHooks,
};
use ptransport::{
    InMemoryTransport, Message, RetryPolicy, Sender, TransportError, TransportOperationHooks,
};

use crate::{
    MetricsObservabilityHooks, SafeSessionHooks, SafeTransportHooks, TracingObservabilityHooks,
};

fn session() -> SessionId {
    SessionId::from("session-1")
}

fn sample_message() -> Message {
    Message::new("hist-1", "session-1", Sender::Support, "hello")
}

fn exercise_transport_hooks(hooks: &dyn TransportOperationHooks) {
    let error = TransportError::timeout("history timeout");

    hooks.on_attempt_start("fetch_messages", &session(), 1);
    hooks.on_retry_scheduled(
        "fetch_messages",
        &session(),
        1,
        Duration::from_millis(10),
        &error,
    );
    hooks.on_success("fetch_messages", &session(), 2);
    hooks.on_failure("fetch_messages", &session(), 2, &error);
}

fn exercise_session_hooks(hooks: &dyn SessionHooks) {
    let session_error = SessionError::from(TransportError::network("offline"));
    let transport_error = TransportError::unavailable("push gone");

    hooks.on_session_changed(None, Some(&session()));
    hooks.on_load_start(&session(), Some(&MessageId::from("srv-4")));
    hooks.on_load_success(&session(), 20, true, Duration::from_millis(30));
    hooks.on_load_failure(&session(), &session_error, Duration::from_millis(30));
    hooks.on_load_discarded(&session());
    hooks.on_send_success(&session(), &sample_message(), Duration::from_millis(5));
    hooks.on_send_failure(&session(), &session_error, Duration::from_millis(5));
    hooks.on_push_message(&session(), &sample_message(), true);
    hooks.on_push_disconnect(&session(), Some(&transport_error));
    hooks.on_push_disconnect(&session(), None);
    hooks.on_typing_failure(&session(), false, &transport_error);
    hooks.on_notice(&Notice::new(NoticeLevel::Info, None, "connected"));
    hooks.on_notice(&Notice::error(&session(), "Failed to send message"));
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_transport_hooks(&TracingObservabilityHooks);
    exercise_session_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_transport_hooks(&MetricsObservabilityHooks);
    exercise_session_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct RecordingTransportHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl TransportOperationHooks for RecordingTransportHooks {
    fn on_attempt_start(&self, _operation: &str, _session_id: &SessionId, _attempt: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push("attempt_start");
    }

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _session_id: &SessionId,
        _attempt: u32,
        _delay: Duration,
        _error: &TransportError,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push("retry_scheduled");
    }

    fn on_success(&self, _operation: &str, _session_id: &SessionId, _attempts: u32) {
        self.events.lock().expect("events lock").push("success");
    }

    fn on_failure(
        &self,
        _operation: &str,
        _session_id: &SessionId,
        _attempts: u32,
        _error: &TransportError,
    ) {
        self.events.lock().expect("events lock").push("failure");
    }
}

struct PanicTransportHooks;

impl TransportOperationHooks for PanicTransportHooks {
    fn on_attempt_start(&self, _operation: &str, _session_id: &SessionId, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_success(&self, _operation: &str, _session_id: &SessionId, _attempts: u32) {
        panic!("success panic");
    }
}

struct PanicSessionHooks;

impl SessionHooks for PanicSessionHooks {
    fn on_session_changed(&self, _previous: Option<&SessionId>, _current: Option<&SessionId>) {
        panic!("session_changed panic");
    }

    fn on_load_success(
        &self,
        _session_id: &SessionId,
        _received: usize,
        _has_more: bool,
        _elapsed: Duration,
    ) {
        panic!("load_success panic");
    }

    fn on_push_message(&self, _session_id: &SessionId, _message: &Message, _duplicate: bool) {
        panic!("push_message panic");
    }

    fn on_notice(&self, _notice: &Notice) {
        panic!("notice panic");
    }
}

#[test]
fn safe_transport_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingTransportHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeTransportHooks::new(inner);

    exercise_transport_hooks(&hooks);

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["attempt_start", "retry_scheduled", "success", "failure"]
    );
}

#[test]
fn safe_hooks_swallow_panics() {
    exercise_transport_hooks(&SafeTransportHooks::new(PanicTransportHooks));
    exercise_session_hooks(&SafeSessionHooks::new(PanicSessionHooks));
}

#[tokio::test]
async fn controller_survives_panicking_hooks() {
    let transport = InMemoryTransport::new();
    transport.seed_history("session-1", vec![sample_message()]);
    let retries = RecordingTransportHooks::default();
    let events = Arc::clone(&retries.events);

    let controller = SessionController::builder(Arc::new(transport.clone()))
        .config(SessionConfig::default().with_fetch_retry(RetryPolicy::new(2)))
        .hooks(Arc::new(SafeSessionHooks::new(PanicSessionHooks)))
        .transport_hooks(Arc::new(SafeTransportHooks::new(retries)))
        .build()
        .expect("controller should build");

    controller
        .set_session(Some(session()))
        .await
        .expect("session should open");
    transport.push_support_message("session-1", "are you there?");

    assert_eq!(controller.snapshot().messages.len(), 2);
    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["attempt_start", "success"]
    );
}
