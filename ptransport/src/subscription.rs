//! Push subscription handles and delivery gating.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use ptransport::Subscription;
//!
//! let released = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&released);
//! let subscription = Subscription::new("s1", move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! subscription.unsubscribe();
//! assert_eq!(released.load(Ordering::SeqCst), 1);
//! ```

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

use pcommon::SessionId;

use crate::{Message, PushHandler, TransportError, TypingEvent};

type Disposer = Box<dyn FnOnce() + Send>;

/// Owned handle to an open push channel.
///
/// The disposer runs exactly once: on [`Subscription::unsubscribe`] or on drop.
pub struct Subscription {
    session_id: SessionId,
    disposer: Option<Disposer>,
}

impl Subscription {
    pub fn new(session_id: impl Into<SessionId>, disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            session_id: session_id.into(),
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("session_id", &self.session_id)
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Shared slot that forwards push events to a handler until closed.
///
/// Delivery holds the slot lock for the duration of the callback, so once
/// [`PushGate::close`] returns no callback is running or will run. Handlers must
/// not close their own gate from inside a callback.
#[derive(Clone)]
pub struct PushGate {
    handler: Arc<Mutex<Option<Arc<dyn PushHandler>>>>,
}

impl PushGate {
    pub fn new(handler: Arc<dyn PushHandler>) -> Self {
        Self {
            handler: Arc::new(Mutex::new(Some(handler))),
        }
    }

    pub fn deliver_message(&self, message: Message) -> bool {
        let Ok(slot) = self.handler.lock() else {
            return false;
        };

        match slot.as_ref() {
            Some(handler) => {
                handler.on_message(message);
                true
            }
            None => false,
        }
    }

    pub fn deliver_typing(&self, event: TypingEvent) -> bool {
        let Ok(slot) = self.handler.lock() else {
            return false;
        };

        match slot.as_ref() {
            Some(handler) => {
                handler.on_typing(event);
                true
            }
            None => false,
        }
    }

    pub fn deliver_disconnect(&self, error: Option<TransportError>) -> bool {
        let Ok(slot) = self.handler.lock() else {
            return false;
        };

        match slot.as_ref() {
            Some(handler) => {
                handler.on_disconnect(error);
                true
            }
            None => false,
        }
    }

    pub fn close(&self) {
        let mut slot = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        slot.take();
    }

    pub fn is_open(&self) -> bool {
        self.handler
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

impl Debug for PushGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushGate")
            .field("open", &self.is_open())
            .finish()
    }
}
