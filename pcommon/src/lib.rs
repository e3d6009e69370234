//! Shared identifiers and async aliases for the parley workspace crates.
//!
//! ```rust
//! use pcommon::{MessageId, SessionId, UserId};
//!
//! let session = SessionId::from("s1");
//! let message = MessageId::new("srv-9");
//! let provisional = MessageId::provisional(3);
//!
//! assert_eq!(session.as_str(), "s1");
//! assert_eq!(message.to_string(), "srv-9");
//! assert!(provisional.is_provisional());
//! assert_eq!(UserId::from("agent-1").as_str(), "agent-1");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod ids {
    //! Opaque string identifiers shared across crates.
    //!
    //! ```rust
    //! use pcommon::{MessageId, SessionId};
    //!
    //! let session = SessionId::new("session-42");
    //! let message = MessageId::from("srv-1".to_string());
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert!(!message.is_provisional());
    //! ```

    use std::fmt::{Display, Formatter};

    /// Prefix reserved for client-generated placeholder ids.
    pub const PROVISIONAL_PREFIX: &str = "local-";

    macro_rules! string_id {
        ($name:ident) => {
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    self.0.as_str()
                }

                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }
        };
    }

    string_id!(SessionId);
    string_id!(MessageId);
    string_id!(UserId);

    impl MessageId {
        /// Builds a client-side placeholder id for a send awaiting confirmation.
        pub fn provisional(sequence: u64) -> Self {
            Self(format!("{PROVISIONAL_PREFIX}{sequence}"))
        }

        pub fn is_provisional(&self) -> bool {
            self.0.starts_with(PROVISIONAL_PREFIX)
        }
    }
}

pub use future::BoxFuture;
pub use ids::{MessageId, PROVISIONAL_PREFIX, SessionId, UserId};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{MessageId, SessionId, UserId};

    #[test]
    fn id_newtypes_round_trip_strings() {
        let session = SessionId::new("session-1");
        let user = UserId::from("user-1");

        assert_eq!(session.as_str(), "session-1");
        assert_eq!(session.to_string(), "session-1");
        assert_eq!(user.clone().into_inner(), "user-1");
    }

    #[test]
    fn provisional_ids_are_distinguishable_from_server_ids() {
        let provisional = MessageId::provisional(7);
        assert_eq!(provisional.as_str(), "local-7");
        assert!(provisional.is_provisional());
        assert!(!MessageId::from("srv-7").is_provisional());
    }

    #[test]
    fn ids_hash_by_value() {
        let mut seen = HashSet::new();
        assert!(seen.insert(MessageId::from("srv-1")));
        assert!(!seen.insert(MessageId::new("srv-1".to_string())));
    }
}
