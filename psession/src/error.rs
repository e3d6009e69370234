//! Session-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use ptransport::{TransportError, TransportErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// A command needing an active session was issued without one.
    Precondition,
    Transport,
    Validation,
    Subscription,
    Configuration,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
    pub retryable: bool,
    pub transport_kind: Option<TransportErrorKind>,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
            transport_kind: None,
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Precondition, message)
    }

    pub fn no_active_session() -> Self {
        Self::precondition("no active chat session")
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Validation, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Configuration, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Runtime, message)
    }

    pub fn subscription(error: TransportError) -> Self {
        Self {
            kind: SessionErrorKind::Subscription,
            message: error.message,
            retryable: error.retryable,
            transport_kind: Some(error.kind),
        }
    }

    pub fn is_precondition(&self) -> bool {
        self.kind == SessionErrorKind::Precondition
    }

    /// Errors the caller can fix by changing the request rather than retrying it.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            SessionErrorKind::Precondition | SessionErrorKind::Validation
        )
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.transport_kind {
            Some(transport_kind) => write!(
                f,
                "{:?} ({:?}): {}",
                self.kind, transport_kind, self.message
            ),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(value: TransportError) -> Self {
        let kind = match value.kind {
            TransportErrorKind::Validation => SessionErrorKind::Validation,
            _ => SessionErrorKind::Transport,
        };

        Self {
            kind,
            message: value.message,
            retryable: value.retryable,
            transport_kind: Some(value.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_keep_kind_and_retryability() {
        let error = SessionError::from(TransportError::timeout("slow backend"));
        assert_eq!(error.kind, SessionErrorKind::Transport);
        assert_eq!(error.transport_kind, Some(TransportErrorKind::Timeout));
        assert!(error.retryable);
        assert!(error.to_string().contains("slow backend"));
    }

    #[test]
    fn validation_and_precondition_are_user_errors() {
        let validation = SessionError::from(TransportError::validation("empty message"));
        assert_eq!(validation.kind, SessionErrorKind::Validation);
        assert!(validation.is_user_error());

        let precondition = SessionError::no_active_session();
        assert!(precondition.is_precondition());
        assert!(precondition.is_user_error());
        assert!(!SessionError::runtime("lock poisoned").is_user_error());
    }
}
