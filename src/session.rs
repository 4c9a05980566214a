//! Authentication context: who is logged in right now.
//!
//! The real session lives with the backend; [`Session`] is the in-process
//! stand-in that the rest of the crate observes through [`AuthContext`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::live::Subscription;

/// Identifier of a portal user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a portal user; drives which navbar sections are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Employee,
    Manager,
    Admin,
}

/// The logged-in user as the session reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            role,
        }
    }
}

/// Read side of the authentication state plus the logout command.
///
/// Components receive an implementation through their constructor rather
/// than resolving a global.
pub trait AuthContext: Send + Sync {
    /// Register an observer of user-or-absent emissions.
    fn subscribe(&self) -> Subscription<Option<User>>;

    /// The user logged in right now, if any.
    fn current_user(&self) -> Option<User>;

    /// End the current session. A no-op when nobody is logged in.
    fn logout(&self);
}

/// In-memory session.
///
/// `Clone` is cheap; all clones share one session.
#[derive(Clone)]
pub struct Session {
    tx: Arc<watch::Sender<Option<User>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.tx.borrow().as_ref().map(|u| u.id))
            .finish()
    }
}

impl Session {
    /// A session with nobody logged in.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Start a session for `user`, replacing any previous one.
    pub fn login(&self, user: User) {
        tracing::info!(user_id = %user.id, role = ?user.role, "user logged in");
        self.tx.send_replace(Some(user));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext for Session {
    fn subscribe(&self) -> Subscription<Option<User>> {
        Subscription::new(self.tx.subscribe())
    }

    fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    fn logout(&self) {
        let previous = self.tx.send_if_modified(|user| user.take().is_some());
        if previous {
            tracing::info!("user logged out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new(7, "Alice Doe", UserRole::Manager)
    }

    #[test]
    fn new_session_is_anonymous() {
        let session = Session::new();
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn login_is_observed() {
        let session = Session::new();
        let mut sub = session.subscribe();

        session.login(alice());
        assert_eq!(sub.poll(), Some(Some(alice())));
        assert_eq!(session.current_user().map(|u| u.id), Some(UserId(7)));
    }

    #[test]
    fn logout_emits_absent_user() {
        let session = Session::new();
        session.login(alice());
        let mut sub = session.subscribe();

        session.logout();
        assert_eq!(sub.poll(), Some(None));
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn logout_without_user_emits_nothing() {
        let session = Session::new();
        let mut sub = session.subscribe();
        session.logout();
        assert_eq!(sub.poll(), None);
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let other = session.clone();
        other.login(alice());
        assert_eq!(session.current_user(), Some(alice()));
    }

    #[test]
    fn user_id_serializes_as_number() {
        let json = serde_json::to_string(&alice()).expect("serialize");
        assert!(json.contains(r#""id":7"#), "got: {json}");
    }
}
