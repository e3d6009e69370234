//! Runtime hook contracts for observing session controller activity.
//!
//! ```rust
//! use psession::{NoopSessionHooks, SessionHooks};
//!
//! fn accepts_hooks(_hooks: &dyn SessionHooks) {}
//!
//! let hooks = NoopSessionHooks;
//! accepts_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::{MessageId, SessionId};
use ptransport::{Message, TransportError};

use crate::{Notice, SessionError};

pub trait SessionHooks: Send + Sync {
    fn on_session_changed(&self, _previous: Option<&SessionId>, _current: Option<&SessionId>) {}

    fn on_load_start(&self, _session_id: &SessionId, _before: Option<&MessageId>) {}

    fn on_load_success(
        &self,
        _session_id: &SessionId,
        _received: usize,
        _has_more: bool,
        _elapsed: Duration,
    ) {
    }

    fn on_load_failure(&self, _session_id: &SessionId, _error: &SessionError, _elapsed: Duration) {}

    fn on_load_discarded(&self, _session_id: &SessionId) {}

    fn on_send_success(&self, _session_id: &SessionId, _message: &Message, _elapsed: Duration) {}

    fn on_send_failure(&self, _session_id: &SessionId, _error: &SessionError, _elapsed: Duration) {}

    fn on_push_message(&self, _session_id: &SessionId, _message: &Message, _duplicate: bool) {}

    fn on_push_disconnect(&self, _session_id: &SessionId, _error: Option<&TransportError>) {}

    fn on_typing_failure(
        &self,
        _session_id: &SessionId,
        _is_typing: bool,
        _error: &TransportError,
    ) {
    }

    fn on_notice(&self, _notice: &Notice) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionHooks;

impl SessionHooks for NoopSessionHooks {}
