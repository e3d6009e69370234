//! Controller configuration with environment overrides.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use psession::SessionConfig;
//!
//! let config = SessionConfig::default()
//!     .with_page_size(50)
//!     .with_typing_timeout(Duration::from_secs(5))
//!     .enable_optimistic_sends();
//!
//! assert_eq!(config.page_size, 50);
//! assert!(config.optimistic_sends);
//! ```

use std::time::Duration;

use pcommon::UserId;
use ptransport::RetryPolicy;

use crate::SessionError;

pub const ENV_PAGE_SIZE: &str = "PARLEY_PAGE_SIZE";
pub const ENV_TYPING_TIMEOUT_MS: &str = "PARLEY_TYPING_TIMEOUT_MS";
pub const ENV_REMOTE_TYPING_TIMEOUT_MS: &str = "PARLEY_REMOTE_TYPING_TIMEOUT_MS";
pub const ENV_OPTIMISTIC_SENDS: &str = "PARLEY_OPTIMISTIC_SENDS";
pub const ENV_LOCAL_USER_ID: &str = "PARLEY_LOCAL_USER_ID";
pub const ENV_FETCH_MAX_ATTEMPTS: &str = "PARLEY_FETCH_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// History page size requested per `load_more`.
    pub page_size: usize,
    /// Quiet period after the last local keystroke before "stopped typing" is sent.
    pub typing_timeout: Duration,
    /// How long a remote "typing" signal stays visible without a follow-up.
    pub remote_typing_timeout: Duration,
    pub optimistic_sends: bool,
    /// Typing events from this user are ignored (the backend echoes our own).
    pub local_user_id: Option<UserId>,
    pub fetch_retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            typing_timeout: Duration::from_secs(3),
            remote_typing_timeout: Duration::from_secs(3),
            optimistic_sends: false,
            local_user_id: None,
            fetch_retry: RetryPolicy::single_attempt(),
        }
    }
}

impl SessionConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_typing_timeout(mut self, typing_timeout: Duration) -> Self {
        self.typing_timeout = typing_timeout;
        self
    }

    pub fn with_remote_typing_timeout(mut self, remote_typing_timeout: Duration) -> Self {
        self.remote_typing_timeout = remote_typing_timeout;
        self
    }

    pub fn with_optimistic_sends(mut self, optimistic_sends: bool) -> Self {
        self.optimistic_sends = optimistic_sends;
        self
    }

    pub fn enable_optimistic_sends(self) -> Self {
        self.with_optimistic_sends(true)
    }

    pub fn with_local_user_id(mut self, local_user_id: impl Into<UserId>) -> Self {
        self.local_user_id = Some(local_user_id.into());
        self
    }

    pub fn with_fetch_retry(mut self, fetch_retry: RetryPolicy) -> Self {
        self.fetch_retry = fetch_retry;
        self
    }

    /// Defaults overridden by `PARLEY_*` environment variables.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_PAGE_SIZE) {
            config = config.with_page_size(parse_number(ENV_PAGE_SIZE, &value)? as usize);
        }

        if let Some(value) = lookup(ENV_TYPING_TIMEOUT_MS) {
            config.typing_timeout =
                Duration::from_millis(parse_number(ENV_TYPING_TIMEOUT_MS, &value)?);
        }

        if let Some(value) = lookup(ENV_REMOTE_TYPING_TIMEOUT_MS) {
            config.remote_typing_timeout =
                Duration::from_millis(parse_number(ENV_REMOTE_TYPING_TIMEOUT_MS, &value)?);
        }

        if let Some(value) = lookup(ENV_OPTIMISTIC_SENDS) {
            config.optimistic_sends = parse_flag(ENV_OPTIMISTIC_SENDS, &value)?;
        }

        if let Some(value) = lookup(ENV_LOCAL_USER_ID) {
            let value = value.trim();
            if !value.is_empty() {
                config.local_user_id = Some(UserId::from(value));
            }
        }

        if let Some(value) = lookup(ENV_FETCH_MAX_ATTEMPTS) {
            let attempts = parse_number(ENV_FETCH_MAX_ATTEMPTS, &value)?;
            config.fetch_retry = RetryPolicy::new(attempts.min(u32::MAX as u64) as u32);
        }

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, SessionError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| {
            SessionError::configuration(format!(
                "{key} must be a non-negative integer, got '{value}'"
            ))
        })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, SessionError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SessionError::configuration(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::SessionErrorKind;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_match_widget_behavior() {
        let config = SessionConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.typing_timeout, Duration::from_secs(3));
        assert!(!config.optimistic_sends);
        assert_eq!(config.fetch_retry.max_attempts, 1);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            (ENV_PAGE_SIZE, "50"),
            (ENV_TYPING_TIMEOUT_MS, "1500"),
            (ENV_OPTIMISTIC_SENDS, "yes"),
            (ENV_LOCAL_USER_ID, "customer-1"),
            (ENV_FETCH_MAX_ATTEMPTS, "4"),
        ]))
        .expect("config should parse");

        assert_eq!(config.page_size, 50);
        assert_eq!(config.typing_timeout, Duration::from_millis(1500));
        assert_eq!(config.remote_typing_timeout, Duration::from_secs(3));
        assert!(config.optimistic_sends);
        assert_eq!(config.local_user_id, Some(UserId::from("customer-1")));
        assert_eq!(config.fetch_retry.max_attempts, 4);
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let error = SessionConfig::from_lookup(lookup_from(&[(ENV_PAGE_SIZE, "lots")]))
            .expect_err("page size should fail");
        assert_eq!(error.kind, SessionErrorKind::Configuration);

        let error = SessionConfig::from_lookup(lookup_from(&[(ENV_OPTIMISTIC_SENDS, "maybe")]))
            .expect_err("flag should fail");
        assert!(error.message.contains(ENV_OPTIMISTIC_SENDS));
    }

    #[test]
    fn page_size_never_drops_to_zero() {
        assert_eq!(SessionConfig::default().with_page_size(0).page_size, 1);
    }
}
