//! In-memory transport with scripted failures and a call log.
//!
//! ```rust
//! use ptransport::{InMemoryTransport, Message, Sender};
//!
//! let transport = InMemoryTransport::new();
//! transport.seed_history("s1", vec![Message::new("srv-1", "s1", Sender::Support, "Welcome!")]);
//!
//! assert_eq!(transport.history("s1").len(), 1);
//! assert_eq!(transport.subscriber_count("s1"), 0);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pcommon::{MessageId, SessionId, UserId};
use tokio::time::Instant;

use crate::{
    ChatTransport, HistoryQuery, Message, MessagePage, MessageStatus, OutgoingMessage, PushGate,
    PushHandler, Sender, Subscription, TransportError, TransportFuture, TypingEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Fetch {
        session_id: SessionId,
        before: Option<MessageId>,
        limit: usize,
    },
    Send {
        session_id: SessionId,
        content: String,
        attachments: usize,
    },
    Typing {
        session_id: SessionId,
        is_typing: bool,
        at: Instant,
    },
    Subscribe {
        session_id: SessionId,
    },
    Unsubscribe {
        session_id: SessionId,
    },
}

#[derive(Default)]
struct MemoryState {
    histories: HashMap<SessionId, Vec<Message>>,
    listeners: HashMap<SessionId, Vec<(u64, PushGate)>>,
    calls: Vec<TransportCall>,
    fetch_failures: VecDeque<TransportError>,
    send_failures: VecDeque<TransportError>,
    typing_failures: VecDeque<TransportError>,
    next_message_seq: u64,
    next_listener_id: u64,
}

impl MemoryState {
    fn gates_for(&self, session_id: &SessionId) -> Vec<PushGate> {
        self.listeners
            .get(session_id)
            .map(|listeners| listeners.iter().map(|(_, gate)| gate.clone()).collect())
            .unwrap_or_default()
    }

    fn next_server_id(&mut self) -> MessageId {
        self.next_message_seq += 1;
        MessageId::new(format!("srv-{}", self.next_message_seq))
    }
}

/// Transport double holding per-session history in memory.
///
/// Sends are assigned `srv-<n>` ids and, unless disabled, echoed on the push
/// channel before the send resolves, the way a live backend broadcasts to every
/// participant including the author.
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<MemoryState>>,
    latency: Duration,
    echo_sends: bool,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            latency: Duration::ZERO,
            echo_sends: true,
        }
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_echo_sends(mut self, echo_sends: bool) -> Self {
        self.echo_sends = echo_sends;
        self
    }

    pub fn seed_history(&self, session_id: impl Into<SessionId>, messages: Vec<Message>) {
        self.state()
            .histories
            .entry(session_id.into())
            .or_default()
            .extend(messages);
    }

    pub fn history(&self, session_id: impl Into<SessionId>) -> Vec<Message> {
        self.state()
            .histories
            .get(&session_id.into())
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_next_fetch(&self, error: TransportError) {
        self.state().fetch_failures.push_back(error);
    }

    pub fn fail_next_send(&self, error: TransportError) {
        self.state().send_failures.push_back(error);
    }

    pub fn fail_next_typing(&self, error: TransportError) {
        self.state().typing_failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.state().calls.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, TransportCall::Fetch { .. }))
            .count()
    }

    pub fn send_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, TransportCall::Send { .. }))
            .count()
    }

    /// Typing signals in emission order as `(session, is_typing, instant)`.
    pub fn typing_events(&self) -> Vec<(SessionId, bool, Instant)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Typing {
                    session_id,
                    is_typing,
                    at,
                } => Some((session_id.clone(), *is_typing, *at)),
                _ => None,
            })
            .collect()
    }

    pub fn subscriber_count(&self, session_id: impl Into<SessionId>) -> usize {
        self.state()
            .listeners
            .get(&session_id.into())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Appends a support-authored message to history and pushes it to subscribers.
    pub fn push_support_message(
        &self,
        session_id: impl Into<SessionId>,
        content: impl Into<String>,
    ) -> Message {
        let session_id = session_id.into();
        let (message, gates) = {
            let mut state = self.state();
            let id = state.next_server_id();
            let message = Message::new(id, session_id.clone(), Sender::Support, content)
                .with_status(MessageStatus::Delivered);
            state
                .histories
                .entry(session_id.clone())
                .or_default()
                .push(message.clone());
            (message, state.gates_for(&session_id))
        };

        for gate in gates {
            gate.deliver_message(message.clone());
        }

        message
    }

    /// Pushes an existing message to subscribers, recording it in history once.
    pub fn push_message(&self, message: Message) -> usize {
        let gates = {
            let mut state = self.state();
            let history = state
                .histories
                .entry(message.session_id.clone())
                .or_default();
            if !history.iter().any(|existing| existing.id == message.id) {
                history.push(message.clone());
            }
            state.gates_for(&message.session_id)
        };

        gates
            .iter()
            .filter(|gate| gate.deliver_message(message.clone()))
            .count()
    }

    pub fn push_typing(
        &self,
        session_id: impl Into<SessionId>,
        user_id: impl Into<UserId>,
        is_typing: bool,
    ) -> usize {
        let gates = self.state().gates_for(&session_id.into());
        let event = TypingEvent::new(user_id, is_typing);

        gates
            .iter()
            .filter(|gate| gate.deliver_typing(event.clone()))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: TransportCall) {
        self.state().calls.push(call);
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl ChatTransport for InMemoryTransport {
    fn fetch_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
        query: HistoryQuery,
    ) -> TransportFuture<'a, Result<MessagePage, TransportError>> {
        Box::pin(async move {
            self.record(TransportCall::Fetch {
                session_id: session_id.clone(),
                before: query.before.clone(),
                limit: query.limit,
            });
            self.simulate_latency().await;

            let mut state = self.state();
            if let Some(error) = state.fetch_failures.pop_front() {
                return Err(error);
            }

            let history = state
                .histories
                .get(session_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let end = match &query.before {
                Some(before) => match history.iter().position(|message| &message.id == before) {
                    Some(index) => index,
                    None => return Ok(MessagePage::default()),
                },
                None => history.len(),
            };
            let start = end.saturating_sub(query.limit);

            Ok(MessagePage {
                messages: history[start..end].to_vec(),
                has_more: start > 0,
            })
        })
    }

    fn send_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        message: OutgoingMessage,
    ) -> TransportFuture<'a, Result<Message, TransportError>> {
        Box::pin(async move {
            self.record(TransportCall::Send {
                session_id: session_id.clone(),
                content: message.content.clone(),
                attachments: message.attachments.len(),
            });
            self.simulate_latency().await;
            message.validate()?;

            let (stored, gates) = {
                let mut state = self.state();
                if let Some(error) = state.send_failures.pop_front() {
                    return Err(error);
                }

                let id = state.next_server_id();
                let stored = Message::new(id, session_id.clone(), Sender::User, message.content)
                    .with_attachments(message.attachments)
                    .with_status(MessageStatus::Sent);
                state
                    .histories
                    .entry(session_id.clone())
                    .or_default()
                    .push(stored.clone());

                let gates = if self.echo_sends {
                    state.gates_for(session_id)
                } else {
                    Vec::new()
                };
                (stored, gates)
            };

            for gate in gates {
                gate.deliver_message(stored.clone());
            }

            Ok(stored)
        })
    }

    fn send_typing_event<'a>(
        &'a self,
        session_id: &'a SessionId,
        is_typing: bool,
    ) -> TransportFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            let mut state = self.state();
            state.calls.push(TransportCall::Typing {
                session_id: session_id.clone(),
                is_typing,
                at: Instant::now(),
            });

            match state.typing_failures.pop_front() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })
    }

    fn subscribe(
        &self,
        session_id: &SessionId,
        handler: Arc<dyn PushHandler>,
    ) -> Result<Subscription, TransportError> {
        let gate = PushGate::new(handler);
        let listener_id = {
            let mut state = self.state();
            state.next_listener_id += 1;
            let listener_id = state.next_listener_id;
            state
                .listeners
                .entry(session_id.clone())
                .or_default()
                .push((listener_id, gate.clone()));
            state.calls.push(TransportCall::Subscribe {
                session_id: session_id.clone(),
            });
            listener_id
        };

        let state = Arc::clone(&self.state);
        let owner = session_id.clone();
        Ok(Subscription::new(session_id.clone(), move || {
            {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(listeners) = state.listeners.get_mut(&owner) {
                    listeners.retain(|(id, _)| *id != listener_id);
                }
                state.calls.push(TransportCall::Unsubscribe { session_id: owner });
            }
            gate.close();
        }))
    }
}
