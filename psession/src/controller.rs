//! Session controller: subscription lifecycle, history paging, sends and typing presence.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use psession::{SessionConfig, SessionController};
//! use ptransport::{InMemoryTransport, Message, Sender};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), psession::SessionError> {
//! let transport = InMemoryTransport::new();
//! transport.seed_history("s1", vec![Message::new("hist-1", "s1", Sender::Support, "Hi!")]);
//!
//! let controller = SessionController::builder(Arc::new(transport.clone()))
//!     .config(SessionConfig::default())
//!     .build()?;
//!
//! controller.set_session(Some("s1".into())).await?;
//! let sent = controller.send("Hello", Vec::new()).await?;
//!
//! let snapshot = controller.snapshot();
//! assert_eq!(snapshot.messages.len(), 2);
//! assert_eq!(snapshot.messages[1].id, sent.id);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use pcommon::{MessageId, SessionId};
use ptransport::{
    Attachment, ChatTransport, HistoryQuery, Message, MessageStatus, NoopOperationHooks,
    OutgoingMessage, PushHandler, Sender, Subscription, TransportError, TransportOperationHooks,
    TypingEvent, execute_with_retry,
};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{
    ChatSession, LoadOutcome, NoopSessionHooks, Notice, SessionConfig, SessionError,
    SessionHooks, SessionSnapshot, SessionStore, SkipReason, SnapshotStream,
};

const NOTICE_CAPACITY: usize = 32;

/// Drives one chat session at a time against a [`ChatTransport`].
///
/// All state lives behind a single lock that is never held across an await or while
/// a subscription is being released. Every session change bumps an epoch; transport
/// results and push events carrying an older epoch are dropped.
pub struct SessionController {
    shared: Arc<Shared>,
}

pub struct SessionControllerBuilder {
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
    hooks: Arc<dyn SessionHooks>,
    transport_hooks: Arc<dyn TransportOperationHooks>,
    runtime: Option<Handle>,
}

impl SessionControllerBuilder {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            config: SessionConfig::default(),
            hooks: Arc::new(NoopSessionHooks),
            transport_hooks: Arc::new(NoopOperationHooks),
            runtime: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn transport_hooks(mut self, transport_hooks: Arc<dyn TransportOperationHooks>) -> Self {
        self.transport_hooks = transport_hooks;
        self
    }

    /// Runtime used for typing timers and the typing delivery task.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<SessionController, SessionError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| {
                SessionError::runtime("session controller must be built inside a tokio runtime")
            })?,
        };

        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let (typing, signals) = mpsc::unbounded_channel();
        runtime.spawn(deliver_typing(
            Arc::clone(&self.transport),
            Arc::clone(&self.hooks),
            signals,
        ));

        Ok(SessionController {
            shared: Arc::new(Shared {
                transport: self.transport,
                config: self.config,
                hooks: self.hooks,
                transport_hooks: self.transport_hooks,
                runtime,
                state: Mutex::new(ControllerState::default()),
                snapshots,
                notices,
                typing,
            }),
        })
    }
}

impl SessionController {
    pub fn builder(transport: Arc<dyn ChatTransport>) -> SessionControllerBuilder {
        SessionControllerBuilder::new(transport)
    }

    pub fn new(
        transport: Arc<dyn ChatTransport>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        Self::builder(transport).config(config).build()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Switches the active session.
    ///
    /// Releases the previous subscription, resets the store and cancels timers. For a
    /// new id it subscribes to the push channel and awaits the first history page.
    /// Setting the current id again does nothing.
    pub async fn set_session(&self, session_id: Option<SessionId>) -> Result<(), SessionError> {
        let (previous, released, epoch) = {
            let mut state = self.shared.lock();
            if state.shut_down {
                return Err(SessionError::precondition("session controller is shut down"));
            }

            if state.session_id == session_id {
                return Ok(());
            }

            let previous = state.session_id.take();
            state.session_id = session_id.clone();
            state.epoch += 1;
            state.store.reset();
            state.local_typing.cancel();
            state.remote_typing.cancel();
            let released = state.subscription.take();
            self.shared.publish(&state);
            (previous, released, state.epoch)
        };

        if let Some(subscription) = released {
            subscription.unsubscribe();
        }

        tracing::debug!(
            previous = previous.as_ref().map(SessionId::as_str),
            current = session_id.as_ref().map(SessionId::as_str),
            epoch,
            "chat session changed"
        );
        self.shared
            .hooks
            .on_session_changed(previous.as_ref(), session_id.as_ref());

        let Some(session_id) = session_id else {
            return Ok(());
        };

        let handler = Arc::new(SessionPushHandler {
            shared: Arc::downgrade(&self.shared),
            session_id: session_id.clone(),
            epoch,
        });

        match self.shared.transport.subscribe(&session_id, handler) {
            Ok(subscription) => {
                let stale = {
                    let mut state = self.shared.lock();
                    if state.is_current(epoch) {
                        state.subscription = Some(subscription);
                        None
                    } else {
                        Some(subscription)
                    }
                };

                if let Some(subscription) = stale {
                    subscription.unsubscribe();
                    return Ok(());
                }
            }
            Err(error) => {
                let error = SessionError::subscription(error);
                {
                    let mut state = self.shared.lock();
                    if state.is_current(epoch) {
                        state.store.set_error(error.clone());
                        self.shared.publish(&state);
                    }
                }

                tracing::warn!(
                    session_id = %session_id,
                    error = %error,
                    "push subscription failed"
                );
                self.shared.notify(Notice::warning(
                    &session_id,
                    format!("Live updates are unavailable: {}", error.message),
                ));
                return Err(error);
            }
        }

        if let Err(error) = self.load_page(Some(epoch)).await {
            tracing::debug!(
                session_id = %session_id,
                error = %error,
                "initial history load failed"
            );
        }

        Ok(())
    }

    /// Opens an active support conversation. Closed sessions are rejected.
    pub async fn open(&self, session: &ChatSession) -> Result<(), SessionError> {
        if !session.is_active() {
            return Err(SessionError::precondition(format!(
                "chat session {} is closed",
                session.id
            )));
        }

        self.set_session(Some(session.id.clone())).await
    }

    /// Fetches the page of history preceding the oldest held message.
    pub async fn load_more(&self) -> Result<LoadOutcome, SessionError> {
        self.load_page(None).await
    }

    async fn load_page(&self, expected_epoch: Option<u64>) -> Result<LoadOutcome, SessionError> {
        let shared = &self.shared;
        let (session_id, epoch, query) = {
            let mut state = shared.lock();
            if expected_epoch.is_some_and(|epoch| !state.is_current(epoch)) {
                return Ok(LoadOutcome::Discarded);
            }

            let Some(session_id) = state.session_id.clone().filter(|_| !state.shut_down) else {
                return Ok(LoadOutcome::Skipped(SkipReason::NoSession));
            };

            if state.store.is_loading() {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }

            if !state.store.has_more() {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }

            state.store.set_loading(true);
            state.store.clear_error();
            let query = match state.store.earliest_id() {
                Some(earliest) => HistoryQuery::before(earliest.clone(), shared.config.page_size),
                None => HistoryQuery::latest(shared.config.page_size),
            };
            shared.publish(&state);
            (session_id, state.epoch, query)
        };

        shared.hooks.on_load_start(&session_id, query.before.as_ref());
        let started = Instant::now();
        let transport = shared.transport.as_ref();
        let result = execute_with_retry(
            "fetch_messages",
            &session_id,
            &shared.config.fetch_retry,
            shared.transport_hooks.as_ref(),
            |_| transport.fetch_messages(&session_id, query.clone()),
            tokio::time::sleep,
        )
        .await;
        let elapsed = started.elapsed();

        let mut state = shared.lock();
        if !state.is_current(epoch) {
            drop(state);
            tracing::debug!(
                session_id = %session_id,
                "discarding history page for inactive session"
            );
            shared.hooks.on_load_discarded(&session_id);
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(page) => {
                let has_more = page.has_more;
                let mut seen = HashSet::new();
                let fresh: Vec<Message> = page
                    .messages
                    .into_iter()
                    .filter(|message| {
                        !state.store.contains(&message.id) && seen.insert(message.id.clone())
                    })
                    .collect();
                let received = fresh.len();

                state.store.prepend_messages(fresh, has_more);
                state.store.set_loading(false);
                shared.publish(&state);
                drop(state);

                shared
                    .hooks
                    .on_load_success(&session_id, received, has_more, elapsed);
                Ok(LoadOutcome::Loaded { received, has_more })
            }
            Err(error) => {
                let error = SessionError::from(error);
                state.store.set_error(error.clone());
                state.store.set_loading(false);
                shared.publish(&state);
                drop(state);

                shared.hooks.on_load_failure(&session_id, &error, elapsed);
                shared.notify(Notice::error(
                    &session_id,
                    format!("Failed to load messages: {}", error.message),
                ));
                Err(error)
            }
        }
    }

    /// Sends a message and appends the server-confirmed copy unless a push already did.
    ///
    /// Without an active session this fails immediately and the transport is not called.
    /// A transport failure is recorded in `error` and leaves the message list as it was,
    /// apart from marking an optimistic placeholder as failed.
    pub async fn send(
        &self,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Message, SessionError> {
        let shared = &self.shared;
        let outgoing = OutgoingMessage::new(content, attachments);

        let (session_id, epoch, provisional) = {
            let mut state = shared.lock();
            let Some(session_id) = state.session_id.clone().filter(|_| !state.shut_down) else {
                return Err(SessionError::no_active_session());
            };

            outgoing.validate()?;

            let provisional = if shared.config.optimistic_sends {
                state.next_provisional += 1;
                let id = MessageId::provisional(state.next_provisional);
                let pending = Message::new(
                    id.clone(),
                    session_id.clone(),
                    Sender::User,
                    outgoing.content.clone(),
                )
                .with_attachments(outgoing.attachments.clone())
                .with_status(MessageStatus::Sending);
                state.store.append_message(pending);
                shared.publish(&state);
                Some(id)
            } else {
                None
            };

            (session_id, state.epoch, provisional)
        };

        let started = Instant::now();
        let result = shared.transport.send_message(&session_id, outgoing).await;
        let elapsed = started.elapsed();

        match result {
            Ok(message) => {
                {
                    let mut state = shared.lock();
                    if state.is_current(epoch) {
                        state.reconcile_sent(provisional.as_ref(), &message);
                        state.store.clear_error();
                        shared.publish(&state);
                    }
                }

                shared.hooks.on_send_success(&session_id, &message, elapsed);
                Ok(message)
            }
            Err(error) => {
                let error = SessionError::from(error);
                {
                    let mut state = shared.lock();
                    if state.is_current(epoch) {
                        if let Some(provisional) = &provisional {
                            state.store.set_status(provisional, MessageStatus::Failed);
                        }
                        state.store.set_error(error.clone());
                        shared.publish(&state);
                    }
                }

                shared.hooks.on_send_failure(&session_id, &error, elapsed);
                shared.notify(Notice::error(
                    &session_id,
                    format!("Failed to send message: {}", error.message),
                ));
                Err(error)
            }
        }
    }

    pub async fn send_attachment(&self, attachment: Attachment) -> Result<Message, SessionError> {
        self.send(String::new(), vec![attachment]).await
    }

    /// Removes a provisional message whose send failed. Returns whether one was removed.
    pub fn discard_failed(&self, id: &MessageId) -> bool {
        let mut state = self.shared.lock();
        let failed = state
            .store
            .messages()
            .iter()
            .any(|message| &message.id == id && message.status == Some(MessageStatus::Failed));
        if !failed {
            return false;
        }

        state.store.remove_message(id);
        self.shared.publish(&state);
        true
    }

    /// Signals local typing activity.
    ///
    /// `true` is sent immediately and a trailing `false` follows once
    /// `typing_timeout` passes without another `true`. `false` cancels the pending
    /// timer and is sent immediately. Without an active session this does nothing.
    pub fn notify_typing(&self, is_typing: bool) {
        let shared = &self.shared;
        let session_id = {
            let mut state = shared.lock();
            let Some(session_id) = state.session_id.clone().filter(|_| !state.shut_down) else {
                return;
            };

            if is_typing {
                let epoch = state.epoch;
                let generation = state.local_typing.rearm();
                let weak = Arc::downgrade(shared);
                let timeout = shared.config.typing_timeout;
                let timer = shared.runtime.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    if let Some(shared) = weak.upgrade() {
                        shared.expire_local_typing(epoch, generation);
                    }
                });
                state.local_typing.handle = Some(timer);
            } else {
                state.local_typing.cancel();
            }

            session_id
        };

        shared.emit_typing(session_id, is_typing);
    }

    /// Releases the push subscription and cancels timers. Idempotent; also run on drop.
    pub fn shutdown(&self) {
        let released = {
            let mut state = self.shared.lock();
            if state.shut_down {
                return;
            }

            state.shut_down = true;
            state.epoch += 1;
            state.local_typing.cancel();
            state.remote_typing.cancel();
            state.subscription.take()
        };

        if let Some(subscription) = released {
            subscription.unsubscribe();
        }

        tracing::debug!("session controller shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock().shut_down
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.lock().session_id.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Stream yielding the current snapshot followed by every later change.
    ///
    /// Intermediate snapshots may be skipped when the consumer lags; the latest is
    /// always delivered.
    pub fn updates(&self) -> SnapshotStream {
        let mut receiver = self.shared.snapshots.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                let snapshot = receiver.borrow_and_update().clone();
                yield snapshot;

                if receiver.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.shared.notices.subscribe()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Shared {
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
    hooks: Arc<dyn SessionHooks>,
    transport_hooks: Arc<dyn TransportOperationHooks>,
    runtime: Handle,
    state: Mutex<ControllerState>,
    snapshots: watch::Sender<SessionSnapshot>,
    notices: broadcast::Sender<Notice>,
    typing: mpsc::UnboundedSender<TypingSignal>,
}

type TypingSignal = (SessionId, bool);

/// Sends typing signals one at a time so the backend sees them in emission order.
/// Ends once the controller is dropped.
async fn deliver_typing(
    transport: Arc<dyn ChatTransport>,
    hooks: Arc<dyn SessionHooks>,
    mut signals: mpsc::UnboundedReceiver<TypingSignal>,
) {
    while let Some((session_id, is_typing)) = signals.recv().await {
        if let Err(error) = transport.send_typing_event(&session_id, is_typing).await {
            tracing::warn!(
                session_id = %session_id,
                is_typing,
                error = %error,
                "typing indicator not delivered"
            );
            hooks.on_typing_failure(&session_id, is_typing, &error);
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ControllerState) {
        self.snapshots
            .send_replace(state.store.snapshot(state.session_id.clone()));
    }

    fn notify(&self, notice: Notice) {
        self.hooks.on_notice(&notice);
        let _ = self.notices.send(notice);
    }

    fn emit_typing(&self, session_id: SessionId, is_typing: bool) {
        if self.typing.send((session_id, is_typing)).is_err() {
            tracing::debug!(is_typing, "typing worker stopped; signal dropped");
        }
    }

    fn expire_local_typing(&self, epoch: u64, generation: u64) {
        let session_id = {
            let mut state = self.lock();
            if !state.is_current(epoch) || !state.local_typing.is_current(generation) {
                return;
            }

            state.local_typing.handle = None;
            match state.session_id.clone() {
                Some(session_id) => session_id,
                None => return,
            }
        };

        self.emit_typing(session_id, false);
    }

    fn expire_remote_typing(&self, epoch: u64, generation: u64) {
        let mut state = self.lock();
        if !state.is_current(epoch) || !state.remote_typing.is_current(generation) {
            return;
        }

        state.remote_typing.handle = None;
        state.store.set_typing(false);
        self.publish(&state);
    }

    fn accept_push_message(&self, session_id: &SessionId, epoch: u64, message: Message) {
        if &message.session_id != session_id {
            tracing::warn!(
                session_id = %session_id,
                message_session = %message.session_id,
                message_id = %message.id,
                "ignoring pushed message for another session"
            );
            return;
        }

        let duplicate = {
            let mut state = self.lock();
            if !state.is_current(epoch) {
                return;
            }

            let duplicate = state.store.contains(&message.id);
            if !duplicate {
                if !state.claim_provisional(&message) {
                    state.store.append_message(message.clone());
                }
                self.publish(&state);
            }
            duplicate
        };

        self.hooks.on_push_message(session_id, &message, duplicate);
    }

    fn accept_remote_typing(self: &Arc<Self>, epoch: u64, event: TypingEvent) {
        if self.config.local_user_id.as_ref() == Some(&event.user_id) {
            return;
        }

        let mut state = self.lock();
        if !state.is_current(epoch) {
            return;
        }

        state.store.set_typing(event.is_typing);
        if event.is_typing {
            let generation = state.remote_typing.rearm();
            let weak = Arc::downgrade(self);
            let timeout = self.config.remote_typing_timeout;
            let timer = self.runtime.spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(shared) = weak.upgrade() {
                    shared.expire_remote_typing(epoch, generation);
                }
            });
            state.remote_typing.handle = Some(timer);
        } else {
            state.remote_typing.cancel();
        }

        self.publish(&state);
    }

    fn accept_disconnect(&self, session_id: &SessionId, epoch: u64, error: Option<TransportError>) {
        let released = {
            let mut state = self.lock();
            if !state.is_current(epoch) {
                return;
            }

            state.remote_typing.cancel();
            if state.store.is_typing() {
                state.store.set_typing(false);
                self.publish(&state);
            }
            state.subscription.take()
        };

        // Released off this callback: the push gate stays locked while it runs.
        if let Some(subscription) = released {
            self.runtime.spawn(async move { subscription.unsubscribe() });
        }

        tracing::warn!(
            session_id = %session_id,
            error = ?error,
            "push channel disconnected"
        );
        self.hooks.on_push_disconnect(session_id, error.as_ref());
        self.notify(Notice::warning(session_id, "Live updates disconnected"));
    }
}

#[derive(Default)]
struct ControllerState {
    session_id: Option<SessionId>,
    epoch: u64,
    store: SessionStore,
    subscription: Option<Subscription>,
    local_typing: TimerSlot,
    remote_typing: TimerSlot,
    next_provisional: u64,
    shut_down: bool,
}

impl ControllerState {
    fn is_current(&self, epoch: u64) -> bool {
        !self.shut_down && self.epoch == epoch
    }

    /// Swaps the oldest pending placeholder with the same content for its pushed
    /// server copy. Returns whether one was replaced.
    fn claim_provisional(&mut self, message: &Message) -> bool {
        if message.sender != Sender::User {
            return false;
        }

        let pending = self
            .store
            .messages()
            .iter()
            .find(|held| {
                held.id.is_provisional()
                    && held.status == Some(MessageStatus::Sending)
                    && held.content == message.content
                    && held.attachments == message.attachments
            })
            .map(|held| held.id.clone());

        match pending {
            Some(id) => self.store.replace_message(&id, message.clone()),
            None => false,
        }
    }

    fn reconcile_sent(&mut self, provisional: Option<&MessageId>, message: &Message) {
        let present = self.store.contains(&message.id);
        match provisional {
            Some(provisional) if present => {
                self.store.remove_message(provisional);
            }
            Some(provisional) => {
                if !self.store.replace_message(provisional, message.clone()) {
                    self.store.append_message(message.clone());
                }
            }
            None if !present => self.store.append_message(message.clone()),
            None => {}
        }
    }
}

/// Cancellable timer; a generation counter rejects expirations from superseded timers.
#[derive(Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerSlot {
    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn rearm(&mut self) -> u64 {
        self.cancel();
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

struct SessionPushHandler {
    shared: Weak<Shared>,
    session_id: SessionId,
    epoch: u64,
}

impl PushHandler for SessionPushHandler {
    fn on_message(&self, message: Message) {
        if let Some(shared) = self.shared.upgrade() {
            shared.accept_push_message(&self.session_id, self.epoch, message);
        }
    }

    fn on_typing(&self, event: TypingEvent) {
        if let Some(shared) = self.shared.upgrade() {
            shared.accept_remote_typing(self.epoch, event);
        }
    }

    fn on_disconnect(&self, error: Option<TransportError>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.accept_disconnect(&self.session_id, self.epoch, error);
        }
    }
}
