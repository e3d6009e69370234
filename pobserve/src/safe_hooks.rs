use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pcommon::{MessageId, SessionId};
use psession::{Notice, SessionError, SessionHooks};
use ptransport::{Message, TransportError, TransportOperationHooks};

pub struct SafeTransportHooks<H> {
    inner: H,
}

impl<H> SafeTransportHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TransportOperationHooks for SafeTransportHooks<H>
where
    H: TransportOperationHooks,
{
    fn on_attempt_start(&self, operation: &str, session_id: &SessionId, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(operation, session_id, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        session_id: &SessionId,
        attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(operation, session_id, attempt, delay, error)
        }));
    }

    fn on_success(&self, operation: &str, session_id: &SessionId, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(operation, session_id, attempts)
        }));
    }

    fn on_failure(
        &self,
        operation: &str,
        session_id: &SessionId,
        attempts: u32,
        error: &TransportError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(operation, session_id, attempts, error)
        }));
    }
}

/// Contains panics raised by the wrapped hooks, including those fired from push callbacks.
pub struct SafeSessionHooks<H> {
    inner: H,
}

impl<H> SafeSessionHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> SessionHooks for SafeSessionHooks<H>
where
    H: SessionHooks,
{
    fn on_session_changed(&self, previous: Option<&SessionId>, current: Option<&SessionId>) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_session_changed(previous, current)
        }));
    }

    fn on_load_start(&self, session_id: &SessionId, before: Option<&MessageId>) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_load_start(session_id, before)
        }));
    }

    fn on_load_success(
        &self,
        session_id: &SessionId,
        received: usize,
        has_more: bool,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_load_success(session_id, received, has_more, elapsed)
        }));
    }

    fn on_load_failure(&self, session_id: &SessionId, error: &SessionError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_load_failure(session_id, error, elapsed)
        }));
    }

    fn on_load_discarded(&self, session_id: &SessionId) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_load_discarded(session_id)));
    }

    fn on_send_success(&self, session_id: &SessionId, message: &Message, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_send_success(session_id, message, elapsed)
        }));
    }

    fn on_send_failure(&self, session_id: &SessionId, error: &SessionError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_send_failure(session_id, error, elapsed)
        }));
    }

    fn on_push_message(&self, session_id: &SessionId, message: &Message, duplicate: bool) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_push_message(session_id, message, duplicate)
        }));
    }

    fn on_push_disconnect(&self, session_id: &SessionId, error: Option<&TransportError>) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_push_disconnect(session_id, error)
        }));
    }

    fn on_typing_failure(&self, session_id: &SessionId, is_typing: bool, error: &TransportError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_typing_failure(session_id, is_typing, error)
        }));
    }

    fn on_notice(&self, notice: &Notice) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_notice(notice)));
    }
}
