//! Session identity, snapshot, and command outcome types.

use std::pin::Pin;

use futures_core::Stream;
use pcommon::{SessionId, UserId};
use ptransport::Message;

use crate::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SessionPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// A support conversation as known to the caller. The controller only uses its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub id: SessionId,
    pub status: SessionStatus,
    pub agent_id: Option<UserId>,
    pub priority: SessionPriority,
    pub tags: Vec<String>,
}

impl ChatSession {
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            status: SessionStatus::Active,
            agent_id: None,
            priority: SessionPriority::Normal,
            tags: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<UserId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_priority(mut self, priority: SessionPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Read-only view of the session store handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub messages: Vec<Message>,
    pub is_typing: bool,
    pub is_loading: bool,
    pub has_more: bool,
    pub error: Option<SessionError>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            messages: Vec::new(),
            is_typing: false,
            is_loading: false,
            has_more: true,
            error: None,
        }
    }
}

pub type SnapshotStream = Pin<Box<dyn Stream<Item = SessionSnapshot> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSession,
    InFlight,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { received: usize, has_more: bool },
    Skipped(SkipReason),
    /// The session changed while the page was in flight; the page was dropped.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-facing notification, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub session_id: Option<SessionId>,
    pub message: String,
}

impl Notice {
    pub fn new(
        level: NoticeLevel,
        session_id: Option<SessionId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            session_id,
            message: message.into(),
        }
    }

    pub fn error(session_id: &SessionId, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, Some(session_id.clone()), message)
    }

    pub fn warning(session_id: &SessionId, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, Some(session_id.clone()), message)
    }
}
