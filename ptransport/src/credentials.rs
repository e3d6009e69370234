//! Bearer token handling that keeps secrets out of logs.

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Access token shared between REST calls and the push connection.
///
/// `Debug` and `Display` never print the value; use [`SecretString::expose`] or
/// [`SecretString::bearer`] at the point of use.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Arc<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into().trim()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::SecretString;

    #[test]
    fn formatting_never_leaks_the_token() {
        let secret = SecretString::from(" tok_live_123\n");
        assert_eq!(format!("{secret:?} {secret}"), "[REDACTED] [REDACTED]");
        assert_eq!(secret.expose(), "tok_live_123");
        assert_eq!(secret.bearer(), "Bearer tok_live_123");
        assert!(SecretString::new("  ").is_empty());
    }
}
