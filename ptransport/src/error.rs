//! Transport failures as seen by the session layer.
//!
//! ```rust
//! use ptransport::{TransportError, TransportErrorKind};
//!
//! let auth = TransportError::authentication("token expired");
//! assert!(!auth.retryable);
//!
//! let timeout = TransportError::timeout("history request timed out");
//! assert!(timeout.retryable);
//! assert_eq!(timeout.kind.as_str(), "timeout");
//!
//! let forced = TransportError::of(TransportErrorKind::Other, "flaky proxy").with_retryable(true);
//! assert!(forced.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Authentication,
    RateLimited,
    /// The request was rejected as malformed, e.g. an empty message.
    Validation,
    Timeout,
    Network,
    Unavailable,
    /// The backend answered with something we could not decode.
    Protocol,
    Other,
}

impl TransportErrorKind {
    /// Whether failures of this kind are usually transient.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Network | Self::Unavailable
        )
    }

    /// Stable lowercase label for logs and metric dimensions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Validation => "validation",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unavailable => "unavailable",
            Self::Protocol => "protocol",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    /// Error whose retryability follows [`TransportErrorKind::is_transient`].
    pub fn of(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, kind.is_transient())
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Authentication, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::RateLimited, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Validation, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Network, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Unavailable, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Protocol, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::of(TransportErrorKind::Other, message)
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind.as_str(), self.message)
    }
}

impl Error for TransportError {}
