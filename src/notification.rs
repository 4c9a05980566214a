//! Notification inbox aggregate -- one user's notifications.
//!
//! The inbox is populated when a user logs in, records move from unread to
//! read only through explicit commands, and the whole set is dropped on
//! logout. Ids come from a counter kept in the state, so they are strictly
//! increasing and never reused within a store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::projection::Projection;
use crate::session::UserId;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Identifier of a notification within an inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    NewIdea,
    ReviewDecision,
    NewComment,
    Other,
}

impl NotificationKind {
    /// Glyph shown next to the notification in the dropdown.
    pub fn icon(self) -> &'static str {
        match self {
            Self::NewIdea => "💡",
            Self::ReviewDecision => "✅",
            Self::NewComment => "💬",
            Self::Other => "🔔",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationStatus {
    Unread,
    Read,
}

/// A notification as held by the inbox. Only `status` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    /// Idea this notification refers to. Not checked against any store.
    pub related_idea_id: Option<u64>,
    /// Display name of the user who triggered the notification.
    pub related_user_name: Option<String>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }
}

/// A notification that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub related_idea_id: Option<u64>,
    pub related_user_name: Option<String>,
}

impl NewNotification {
    /// An unread notification with no cross-references.
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            kind,
            message: message.into(),
            status: NotificationStatus::Unread,
            created_at,
            related_idea_id: None,
            related_user_name: None,
        }
    }

    pub fn with_related_idea(mut self, idea_id: u64) -> Self {
        self.related_idea_id = Some(idea_id);
        self
    }

    pub fn with_related_user(mut self, name: impl Into<String>) -> Self {
        self.related_user_name = Some(name.into());
        self
    }

    /// Mark the notification as already read.
    pub fn read(mut self) -> Self {
        self.status = NotificationStatus::Read;
        self
    }

    fn with_id(self, id: NotificationId) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            kind: self.kind,
            message: self.message,
            status: self.status,
            created_at: self.created_at,
            related_idea_id: self.related_idea_id,
            related_user_name: self.related_user_name,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The notifications of the user currently logged in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inbox {
    /// Owner of the loaded set; `None` before login and after logout.
    pub user_id: Option<UserId>,
    /// Most recently added first; loaded records keep source order.
    pub notifications: Vec<Notification>,
    /// Highest id ever assigned by this inbox.
    pub last_id: u64,
}

impl Inbox {
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| n.is_unread()).count()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    fn next_id(&self, offset: u64) -> NotificationId {
        NotificationId(self.last_id + 1 + offset)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands accepted by the [`Inbox`] aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InboxCommand {
    /// Replace the inbox contents with `notifications` for `user_id`.
    Load {
        user_id: UserId,
        notifications: Vec<NewNotification>,
    },
    MarkRead {
        id: NotificationId,
    },
    MarkAllRead,
    /// Prepend a new notification.
    Add {
        notification: NewNotification,
    },
    /// Empty the collection, keeping the owner.
    Clear,
    /// Drop the collection and the owner (logout).
    Discard,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Domain events produced by the [`Inbox`] aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InboxEvent {
    Loaded {
        user_id: UserId,
        notifications: Vec<Notification>,
    },
    MarkedRead {
        id: NotificationId,
    },
    AllMarkedRead,
    Added {
        notification: Notification,
    },
    Cleared,
    Discarded,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when handling an [`InboxCommand`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InboxError {
    #[error("notification {0} does not exist")]
    UnknownNotification(NotificationId),
}

// ---------------------------------------------------------------------------
// Aggregate impl
// ---------------------------------------------------------------------------

impl Aggregate for Inbox {
    const AGGREGATE_TYPE: &'static str = "inbox";
    type Command = InboxCommand;
    type DomainEvent = InboxEvent;
    type Error = InboxError;

    fn handle(&self, cmd: InboxCommand) -> Result<Vec<InboxEvent>, InboxError> {
        match cmd {
            InboxCommand::Load {
                user_id,
                notifications,
            } => {
                let notifications = notifications
                    .into_iter()
                    .zip(0..)
                    .map(|(n, offset)| n.with_id(self.next_id(offset)))
                    .collect();
                Ok(vec![InboxEvent::Loaded {
                    user_id,
                    notifications,
                }])
            }
            InboxCommand::MarkRead { id } => match self.get(id) {
                None => Err(InboxError::UnknownNotification(id)),
                Some(n) if !n.is_unread() => Ok(vec![]),
                Some(_) => Ok(vec![InboxEvent::MarkedRead { id }]),
            },
            InboxCommand::MarkAllRead => {
                if self.unread_count() == 0 {
                    return Ok(vec![]);
                }
                Ok(vec![InboxEvent::AllMarkedRead])
            }
            InboxCommand::Add { notification } => Ok(vec![InboxEvent::Added {
                notification: notification.with_id(self.next_id(0)),
            }]),
            InboxCommand::Clear => {
                if self.is_empty() {
                    return Ok(vec![]);
                }
                Ok(vec![InboxEvent::Cleared])
            }
            InboxCommand::Discard => {
                if self.user_id.is_none() && self.is_empty() {
                    return Ok(vec![]);
                }
                Ok(vec![InboxEvent::Discarded])
            }
        }
    }

    fn apply(mut self, event: &InboxEvent) -> Self {
        match event {
            InboxEvent::Loaded {
                user_id,
                notifications,
            } => {
                self.user_id = Some(*user_id);
                self.notifications = notifications.clone();
                if let Some(max) = notifications.iter().map(|n| n.id.0).max() {
                    self.last_id = self.last_id.max(max);
                }
            }
            InboxEvent::MarkedRead { id } => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.id == *id) {
                    n.status = NotificationStatus::Read;
                }
            }
            InboxEvent::AllMarkedRead => {
                for n in &mut self.notifications {
                    n.status = NotificationStatus::Read;
                }
            }
            InboxEvent::Added { notification } => {
                self.last_id = self.last_id.max(notification.id.0);
                self.notifications.insert(0, notification.clone());
            }
            InboxEvent::Cleared => self.notifications.clear(),
            InboxEvent::Discarded => {
                self.user_id = None;
                self.notifications.clear();
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Number of unread notifications; the navbar badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadCount(pub usize);

impl Projection<Inbox> for UnreadCount {
    const NAME: &'static str = "unread-count";

    fn project(state: &Inbox) -> Self {
        UnreadCount(state.unread_count())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
