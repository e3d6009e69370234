//! Retry scheduling for transport calls and the hooks that observe it.
//!
//! Only history reads go through [`execute_with_retry`]; sends are never replayed
//! because the backend may already have persisted the message.

use std::future::Future;
use std::time::Duration;

use pcommon::SessionId;

use crate::TransportError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `initial * factor^(n-1)`, capped at `cap`.
    Exponential {
        initial: Duration,
        factor: u32,
        cap: Duration,
    },
}

impl Backoff {
    fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential {
                initial,
                factor,
                cap,
            } => {
                let scale = factor.max(1).saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(scale).min(cap)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(500),
                factor: 2,
                cap: Duration::from_secs(8),
            },
        }
    }

    pub fn single_attempt() -> Self {
        Self::new(1)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn is_single_attempt(&self) -> bool {
        self.max_attempts <= 1
    }

    /// Delay to wait after `attempt` failed with `error`, or `None` when the call
    /// should give up.
    pub fn next_delay(&self, attempt: u32, error: &TransportError) -> Option<Duration> {
        (error.retryable && attempt < self.max_attempts).then(|| self.backoff.delay_after(attempt))
    }
}

/// Observer for individual transport attempts. Every method defaults to a no-op.
pub trait TransportOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _operation: &str, _session_id: &SessionId, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _session_id: &SessionId,
        _attempt: u32,
        _delay: Duration,
        _error: &TransportError,
    ) {
    }

    fn on_success(&self, _operation: &str, _session_id: &SessionId, _attempts: u32) {}

    fn on_failure(
        &self,
        _operation: &str,
        _session_id: &SessionId,
        _attempts: u32,
        _error: &TransportError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl TransportOperationHooks for NoopOperationHooks {}

/// Runs `call` until it succeeds, fails with a non-retryable error, or the policy
/// runs out of attempts. `sleep` is injected so callers choose the timer.
pub async fn execute_with_retry<T, Call, CallFuture, Sleep, SleepFuture>(
    operation: &str,
    session_id: &SessionId,
    policy: &RetryPolicy,
    hooks: &dyn TransportOperationHooks,
    mut call: Call,
    mut sleep: Sleep,
) -> Result<T, TransportError>
where
    Call: FnMut(u32) -> CallFuture,
    CallFuture: Future<Output = Result<T, TransportError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 0;

    let error = loop {
        attempt += 1;
        hooks.on_attempt_start(operation, session_id, attempt);

        let error = match call(attempt).await {
            Ok(value) => {
                hooks.on_success(operation, session_id, attempt);
                return Ok(value);
            }
            Err(error) => error,
        };

        let Some(delay) = policy.next_delay(attempt, &error) else {
            break error;
        };

        hooks.on_retry_scheduled(operation, session_id, attempt, delay, &error);
        sleep(delay).await;
    };

    hooks.on_failure(operation, session_id, attempt, &error);
    Err(error)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::TransportErrorKind;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<String>>,
    }

    impl EventLog {
        fn push(&self, event: String) {
            self.events.lock().expect("events lock").push(event);
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.events.lock().expect("events lock"))
        }
    }

    impl TransportOperationHooks for EventLog {
        fn on_attempt_start(&self, operation: &str, session_id: &SessionId, attempt: u32) {
            self.push(format!("{session_id} {operation} start {attempt}"));
        }

        fn on_retry_scheduled(
            &self,
            _operation: &str,
            _session_id: &SessionId,
            attempt: u32,
            delay: Duration,
            _error: &TransportError,
        ) {
            self.push(format!("retry {attempt} after {}ms", delay.as_millis()));
        }

        fn on_success(&self, _operation: &str, _session_id: &SessionId, attempts: u32) {
            self.push(format!("ok after {attempts}"));
        }

        fn on_failure(
            &self,
            _operation: &str,
            _session_id: &SessionId,
            attempts: u32,
            error: &TransportError,
        ) {
            self.push(format!("gave up after {attempts}: {:?}", error.kind));
        }
    }

    #[test]
    fn next_delay_respects_retryable_flag_and_attempt_limit() {
        let policy = RetryPolicy::new(3).with_backoff(Backoff::Fixed(Duration::from_millis(50)));
        let timeout = TransportError::timeout("timed out");

        assert_eq!(policy.next_delay(1, &timeout), Some(Duration::from_millis(50)));
        assert_eq!(policy.next_delay(2, &timeout), Some(Duration::from_millis(50)));
        assert_eq!(policy.next_delay(3, &timeout), None);
        assert_eq!(policy.next_delay(1, &TransportError::validation("empty")), None);
        assert!(RetryPolicy::single_attempt().is_single_attempt());
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(100),
            factor: 3,
            cap: Duration::from_millis(500),
        };

        assert_eq!(backoff.delay_after(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(300));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(500));
        assert_eq!(backoff.delay_after(40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let hooks = EventLog::default();
        let slept = Mutex::new(Vec::new());
        let session = SessionId::from("s1");

        let page = execute_with_retry(
            "fetch_messages",
            &session,
            &RetryPolicy::new(3),
            &hooks,
            |attempt| async move {
                if attempt < 3 {
                    Err(TransportError::network("connection reset"))
                } else {
                    Ok(attempt)
                }
            },
            |delay| {
                slept.lock().expect("sleep lock").push(delay);
                async {}
            },
        )
        .await
        .expect("third attempt succeeds");

        assert_eq!(page, 3);
        assert_eq!(
            *slept.lock().expect("sleep lock"),
            vec![Duration::from_millis(500), Duration::from_secs(1)]
        );
        assert_eq!(
            hooks.take(),
            vec![
                "s1 fetch_messages start 1",
                "retry 1 after 500ms",
                "s1 fetch_messages start 2",
                "retry 2 after 1000ms",
                "s1 fetch_messages start 3",
                "ok after 3",
            ]
        );
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_immediately() {
        let hooks = EventLog::default();
        let session = SessionId::from("s2");

        let error = execute_with_retry::<(), _, _, _, _>(
            "fetch_messages",
            &session,
            &RetryPolicy::new(5),
            &hooks,
            |_| async { Err(TransportError::authentication("token expired")) },
            |_| async {},
        )
        .await
        .expect_err("authentication is final");

        assert_eq!(error.kind, TransportErrorKind::Authentication);
        assert_eq!(
            hooks.take(),
            vec!["s2 fetch_messages start 1", "gave up after 1: Authentication"]
        );
    }
}
