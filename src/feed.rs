//! Notification store service and the session gate that feeds it.
//!
//! [`NotificationStore`] is the single source of truth for the logged-in
//! user's notifications. [`SessionGate`] connects it to an
//! [`AuthContext`]: a user appearing loads their notifications, the user
//! going away discards them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

use crate::command::CommandContext;
use crate::error::ExecuteError;
use crate::live::Subscription;
use crate::notification::{
    Inbox, InboxCommand, InboxError, InboxEvent, NewNotification, Notification, NotificationId,
    NotificationKind, UnreadCount,
};
use crate::session::{AuthContext, User, UserId};
use crate::store::StateStore;

/// Result type of notification store commands.
pub type InboxResult = Result<(), ExecuteError<InboxError>>;

/// Where a user's notifications come from when they log in.
///
/// Stands in for the backend fetch; implementations must not block.
pub trait NotificationSource: Send + Sync {
    /// Notifications for `user`, in display order.
    fn fetch(&self, user: &User, now: DateTime<Utc>) -> Vec<NewNotification>;
}

/// Fixed demonstration set used until the backend exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedSource;

impl NotificationSource for SeedSource {
    fn fetch(&self, user: &User, now: DateTime<Utc>) -> Vec<NewNotification> {
        let id = user.id;
        vec![
            NewNotification::new(
                id,
                NotificationKind::NewIdea,
                r#"New idea submitted: "Improve Employee Onboarding Process""#,
                now,
            )
            .with_related_idea(101)
            .with_related_user("John Doe"),
            NewNotification::new(
                id,
                NotificationKind::ReviewDecision,
                r#"Your idea "Remote Work Policy Enhancement" has been approved"#,
                now - Duration::hours(1),
            )
            .with_related_idea(102)
            .with_related_user("Manager Smith"),
            NewNotification::new(
                id,
                NotificationKind::NewComment,
                r#"Jane Doe commented on your idea "Office Space Redesign""#,
                now - Duration::hours(2),
            )
            .with_related_idea(103)
            .with_related_user("Jane Doe")
            .read(),
            NewNotification::new(
                id,
                NotificationKind::NewComment,
                r#"New comment on "Team Building Activities""#,
                now - Duration::hours(24),
            )
            .with_related_idea(104)
            .with_related_user("Admin User")
            .read(),
        ]
    }
}

/// Notification store for the current user.
///
/// `Clone` is cheap; clones share one inbox.
#[derive(Clone)]
pub struct NotificationStore {
    inbox: StateStore<Inbox>,
    source: Arc<dyn NotificationSource>,
}

impl std::fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStore")
            .field("inbox", &self.inbox)
            .finish()
    }
}

impl NotificationStore {
    pub fn new(inbox: StateStore<Inbox>, source: Arc<dyn NotificationSource>) -> Self {
        Self { inbox, source }
    }

    /// In-memory store fed by [`SeedSource`].
    pub fn seeded() -> Self {
        Self::new(StateStore::in_memory(), Arc::new(SeedSource))
    }

    /// (Re)populate the inbox with `user`'s notifications.
    pub fn load(&self, user: &User) -> InboxResult {
        let notifications = self.source.fetch(user, Utc::now());
        tracing::info!(
            user_id = %user.id,
            count = notifications.len(),
            "loading notifications"
        );
        self.inbox.execute(
            InboxCommand::Load {
                user_id: user.id,
                notifications,
            },
            &CommandContext::default().with_actor(user.id.to_string()),
        )?;
        Ok(())
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// [`InboxError::UnknownNotification`] if `id` is not in the inbox.
    pub fn mark_read(&self, id: NotificationId, ctx: &CommandContext) -> InboxResult {
        self.inbox.execute(InboxCommand::MarkRead { id }, ctx)?;
        Ok(())
    }

    pub fn mark_all_read(&self, ctx: &CommandContext) -> InboxResult {
        self.inbox.execute(InboxCommand::MarkAllRead, ctx)?;
        Ok(())
    }

    /// Prepend `notification` under a freshly assigned id.
    ///
    /// # Returns
    ///
    /// The id the notification was stored under.
    pub fn add(
        &self,
        notification: NewNotification,
        ctx: &CommandContext,
    ) -> Result<NotificationId, ExecuteError<InboxError>> {
        let events = self.inbox.execute(InboxCommand::Add { notification }, ctx)?;
        match events.as_slice() {
            [InboxEvent::Added { notification }] => Ok(notification.id),
            other => unreachable!("Add must yield exactly one Added event, got {other:?}"),
        }
    }

    pub fn clear(&self, ctx: &CommandContext) -> InboxResult {
        self.inbox.execute(InboxCommand::Clear, ctx)?;
        Ok(())
    }

    /// Drop the inbox contents and owner.
    pub fn discard(&self, ctx: &CommandContext) -> InboxResult {
        self.inbox.execute(InboxCommand::Discard, ctx)?;
        Ok(())
    }

    /// Current notifications, newest additions first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inbox.state().notifications
    }

    pub fn unread_count(&self) -> usize {
        self.inbox.project::<UnreadCount>().0
    }

    /// Owner of the loaded set.
    pub fn user_id(&self) -> Option<UserId> {
        self.inbox.state().user_id
    }

    pub fn snapshot(&self) -> Inbox {
        self.inbox.state()
    }

    pub fn subscribe(&self) -> Subscription<Inbox> {
        self.inbox.subscribe()
    }

    /// Number of live subscriptions on the inbox.
    pub fn observer_count(&self) -> usize {
        self.inbox.observer_count()
    }
}

/// What [`SessionGate::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChange {
    /// The inbox was loaded for this user.
    Loaded(UserId),
    /// The inbox was discarded because nobody is logged in.
    Discarded,
    /// The session did not change.
    Unchanged,
}

/// Applies the authentication gate to a [`NotificationStore`].
#[derive(Debug)]
pub struct SessionGate {
    session: Subscription<Option<User>>,
    store: NotificationStore,
    loaded_for: Option<UserId>,
}

impl SessionGate {
    /// Create a gate; call [`sync`](SessionGate::sync) once to apply the
    /// session state that is current at construction.
    pub fn new(auth: &dyn AuthContext, store: NotificationStore) -> Self {
        let loaded_for = store.user_id();
        Self {
            session: auth.subscribe(),
            store,
            loaded_for,
        }
    }

    /// Bring the inbox in line with the latest session state.
    ///
    /// Any session emission observed since the last sync that carries a
    /// user counts as a login and reloads the inbox, even for the user
    /// already loaded: a logout followed by a login between two syncs
    /// still starts from a fresh set.
    pub fn sync(&mut self) -> Result<GateChange, ExecuteError<InboxError>> {
        // Decide on the latest value so the first call also covers the
        // state at construction time.
        let emitted = self.session.poll().is_some();
        let user = self.session.current();
        self.apply(user, emitted)
    }

    fn apply(
        &mut self,
        user: Option<User>,
        emitted: bool,
    ) -> Result<GateChange, ExecuteError<InboxError>> {
        let ctx = CommandContext::system("session-gate");
        match user {
            Some(user) if !emitted && self.loaded_for == Some(user.id) => {
                Ok(GateChange::Unchanged)
            }
            Some(user) => {
                self.store.load(&user)?;
                self.loaded_for = Some(user.id);
                tracing::debug!(user_id = %user.id, "gate opened");
                Ok(GateChange::Loaded(user.id))
            }
            None if self.loaded_for.is_none() && self.store.user_id().is_none() => {
                Ok(GateChange::Unchanged)
            }
            None => {
                self.store.discard(&ctx)?;
                self.loaded_for = None;
                tracing::debug!("gate closed");
                Ok(GateChange::Discarded)
            }
        }
    }

    /// Follow the session until `shutdown` flips to `true` or the session
    /// is dropped, applying the gate after every emission.
    ///
    /// Errors from individual gate applications are logged and the loop
    /// keeps following.
    pub async fn follow(mut self, mut shutdown: watch::Receiver<bool>) {
        if let Err(e) = self.sync() {
            tracing::warn!(error = %e, "initial session sync failed");
        }
        loop {
            tokio::select! {
                changed = self.session.changed() => {
                    let Some(user) = changed else {
                        tracing::debug!("session dropped, gate stopping");
                        break;
                    };
                    if let Err(e) = self.apply(user, true) {
                        tracing::warn!(error = %e, "session sync failed");
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationStatus;
    use crate::session::{Session, UserRole};

    fn alice() -> User {
        User::new(1, "Alice", UserRole::Employee)
    }

    fn bob() -> User {
        User::new(2, "Bob", UserRole::Admin)
    }

    fn ctx() -> CommandContext {
        CommandContext::default().with_actor("1")
    }

    #[test]
    fn seed_source_matches_demo_set() {
        let now = Utc::now();
        let seed = SeedSource.fetch(&alice(), now);
        assert_eq!(seed.len(), 4);
        assert!(seed.iter().all(|n| n.user_id == UserId(1)));
        let unread = seed
            .iter()
            .filter(|n| n.status == NotificationStatus::Unread)
            .count();
        assert_eq!(unread, 2);
        assert_eq!(seed[3].created_at, now - Duration::hours(24));
    }

    #[test]
    fn load_then_mutations_keep_unread_consistent() {
        let store = NotificationStore::seeded();
        store.load(&alice()).expect("load");
        assert_eq!(store.unread_count(), 2);

        store.mark_read(NotificationId(1), &ctx()).expect("mark read");
        assert_eq!(store.unread_count(), 1);

        store.mark_all_read(&ctx()).expect("mark all");
        assert_eq!(store.unread_count(), 0);

        let id = store
            .add(
                NewNotification::new(UserId(1), NotificationKind::NewIdea, "fresh", Utc::now()),
                &ctx(),
            )
            .expect("add");
        assert_eq!(id, NotificationId(5));
        assert_eq!(store.notifications()[0].id, id);
        assert_eq!(store.unread_count(), 1);

        store.clear(&ctx()).expect("clear");
        assert!(store.notifications().is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn mark_read_unknown_id_surfaces_domain_error() {
        let store = NotificationStore::seeded();
        store.load(&alice()).unwrap();
        let err = store.mark_read(NotificationId(42), &ctx()).unwrap_err();
        assert_eq!(
            err.domain(),
            Some(&InboxError::UnknownNotification(NotificationId(42)))
        );
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn every_mutation_redelivers_snapshot() {
        let store = NotificationStore::seeded();
        let mut sub = store.subscribe();
        store.load(&alice()).unwrap();
        let snap = sub.poll().expect("load delivers a snapshot");
        assert_eq!(snap.len(), 4);

        store.mark_read(NotificationId(2), &ctx()).unwrap();
        let snap = sub.poll().expect("mark read delivers a snapshot");
        assert_eq!(snap.unread_count(), 1);
        assert_eq!(snap.len(), 4, "snapshot is the full set, not a delta");
    }

    #[test]
    fn gate_loads_on_login_and_discards_on_logout() {
        let session = Session::new();
        let store = NotificationStore::seeded();
        let mut gate = SessionGate::new(&session, store.clone());

        assert_eq!(gate.sync().unwrap(), GateChange::Unchanged);
        assert!(store.notifications().is_empty());

        session.login(alice());
        assert_eq!(gate.sync().unwrap(), GateChange::Loaded(UserId(1)));
        assert_eq!(store.notifications().len(), 4);
        assert_eq!(gate.sync().unwrap(), GateChange::Unchanged);

        session.logout();
        assert_eq!(gate.sync().unwrap(), GateChange::Discarded);
        assert!(store.notifications().is_empty());
        assert_eq!(store.user_id(), None);
    }

    #[test]
    fn gate_applies_session_current_at_construction() {
        let session = Session::new();
        session.login(alice());
        let store = NotificationStore::seeded();
        let mut gate = SessionGate::new(&session, store.clone());

        assert_eq!(gate.sync().unwrap(), GateChange::Loaded(UserId(1)));
    }

    #[test]
    fn gate_reloads_when_user_switches() {
        let session = Session::new();
        let store = NotificationStore::seeded();
        let mut gate = SessionGate::new(&session, store.clone());

        session.login(alice());
        gate.sync().unwrap();
        store.mark_all_read(&ctx()).unwrap();

        session.login(bob());
        assert_eq!(gate.sync().unwrap(), GateChange::Loaded(UserId(2)));
        assert_eq!(store.user_id(), Some(UserId(2)));
        assert_eq!(store.unread_count(), 2);
        assert!(store.notifications().iter().all(|n| n.user_id == UserId(2)));
    }

    #[test]
    fn relogin_between_syncs_reloads_fresh_set() {
        let session = Session::new();
        let store = NotificationStore::seeded();
        let mut gate = SessionGate::new(&session, store.clone());

        session.login(alice());
        gate.sync().unwrap();
        store.mark_all_read(&ctx()).unwrap();
        let first_ids: Vec<_> = store.notifications().iter().map(|n| n.id).collect();

        session.logout();
        session.login(alice());
        assert_eq!(gate.sync().unwrap(), GateChange::Loaded(UserId(1)));
        assert_eq!(store.unread_count(), 2);
        assert!(
            store
                .notifications()
                .iter()
                .all(|n| !first_ids.contains(&n.id))
        );
    }

    #[test]
    fn add_returns_id_of_stored_record() {
        let store = NotificationStore::seeded();
        store.load(&alice()).unwrap();
        let a = store
            .add(
                NewNotification::new(UserId(1), NotificationKind::Other, "a", Utc::now()),
                &ctx(),
            )
            .unwrap();
        let b = store
            .add(
                NewNotification::new(UserId(1), NotificationKind::Other, "b", Utc::now()),
                &ctx(),
            )
            .unwrap();
        assert!(b > a);
        assert_eq!(store.snapshot().get(a).map(|n| n.message.as_str()), Some("a"));
        assert_eq!(store.notifications()[0].id, b);
    }

    #[tokio::test]
    async fn follow_reloads_when_same_user_returns() {
        let session = Session::new();
        let store = NotificationStore::seeded();
        let gate = SessionGate::new(&session, store.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut inbox = store.subscribe();

        session.login(alice());
        let task = tokio::spawn(gate.follow(shutdown_rx));
        tokio::time::timeout(std::time::Duration::from_secs(2), inbox.changed())
            .await
            .expect("gate should load within timeout")
            .expect("store alive");
        store.mark_all_read(&ctx()).unwrap();
        let _ = inbox.poll();

        // Both emissions land before the task wakes up again.
        session.logout();
        session.login(alice());
        let snap = tokio::time::timeout(std::time::Duration::from_secs(2), inbox.changed())
            .await
            .expect("gate should reload within timeout")
            .expect("store alive");
        assert_eq!(snap.user_id, Some(UserId(1)));
        assert_eq!(snap.unread_count(), 2);

        shutdown_tx.send_replace(true);
        tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("gate should stop on shutdown")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn follow_tracks_session_until_shutdown() {
        let session = Session::new();
        let store = NotificationStore::seeded();
        let gate = SessionGate::new(&session, store.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut inbox = store.subscribe();

        let task = tokio::spawn(gate.follow(shutdown_rx));

        session.login(alice());
        let snap = tokio::time::timeout(std::time::Duration::from_secs(2), inbox.changed())
            .await
            .expect("gate should load within timeout")
            .expect("store alive");
        assert_eq!(snap.user_id, Some(UserId(1)));

        session.logout();
        let snap = tokio::time::timeout(std::time::Duration::from_secs(2), inbox.changed())
            .await
            .expect("gate should discard within timeout")
            .expect("store alive");
        assert!(snap.is_empty());

        shutdown_tx.send_replace(true);
        tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("gate should stop on shutdown")
            .expect("task should not panic");
    }
}
