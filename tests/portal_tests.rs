//! End-to-end tests for the portal: session gate, navbar, category admin.
//!
//! Tests cover:
//! - Login loads the inbox and the navbar renders it
//! - Marking notifications read through the navbar
//! - Navbar logout navigates and discards the inbox
//! - Logging back in as the same user reloads a fresh inbox
//! - Category admin flow with confirm/alert prompts
//! - Reopening restores categories and starts logged out with an empty inbox
//! - `SessionGate::follow` on a tokio task

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use idea_portal::{
    AuthContext, CategoryRepository, ElementPath, FormOutcome, GateChange,
    NOTIFICATION_DROPDOWN_ROOT, Navigator, NotificationStatus, Portal, Prompt, User, UserId,
    UserRole,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingNavigator {
    urls: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate_by_url(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

struct FixedPrompt {
    answer: bool,
    alerts: Mutex<Vec<String>>,
}

impl FixedPrompt {
    fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            alerts: Mutex::new(Vec::new()),
        })
    }
}

impl Prompt for FixedPrompt {
    fn confirm(&self, _message: &str) -> bool {
        self.answer
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

fn admin() -> User {
    User::new(1, "ada Admin", UserRole::Admin)
}

// ---------------------------------------------------------------------------
// Navbar + notifications
// ---------------------------------------------------------------------------

#[test]
fn navbar_follows_login_and_inbox() {
    let mut portal = Portal::in_memory().expect("open portal");
    let nav = Arc::new(RecordingNavigator::default());
    let mut navbar = portal.navbar(nav.clone());
    assert!(!navbar.view().logged_in);
    assert_eq!(navbar.user_initial(), "?");

    portal.login(admin()).expect("login");
    assert!(navbar.refresh());
    assert!(navbar.view().logged_in);
    assert!(navbar.is_admin());
    assert_eq!(navbar.user_initial(), "A");
    assert_eq!(navbar.notifications().len(), 4);
    assert_eq!(navbar.unread_count(), 2);

    let first = navbar.notifications()[0].id;
    navbar.mark_read(first);
    assert_eq!(navbar.unread_count(), 1);
    assert_eq!(navbar.notifications()[0].status, NotificationStatus::Read);

    navbar.mark_all_read();
    assert_eq!(navbar.unread_count(), 0);
    assert_eq!(portal.notifications().unread_count(), 0);
}

#[test]
fn navbar_logout_navigates_and_gate_discards() {
    let mut portal = Portal::builder()
        .landing_route("/login")
        .open()
        .expect("open portal");
    portal.login(admin()).expect("login");
    let nav = Arc::new(RecordingNavigator::default());
    let mut navbar = portal.navbar(nav.clone());

    navbar.toggle_notification_dropdown();
    navbar.on_document_click(&ElementPath::new([NOTIFICATION_DROPDOWN_ROOT]));
    assert!(navbar.dropdowns().notifications_open);

    navbar.logout();
    assert!(!navbar.dropdowns().notifications_open);
    assert!(!navbar.view().logged_in);
    assert_eq!(nav.urls.lock().unwrap().as_slice(), ["/login"]);
    assert!(portal.session().current_user().is_none());
    assert!(navbar.notifications().is_empty());
    assert_eq!(navbar.unread_count(), 0);
    assert!(portal.notifications().notifications().is_empty());

    assert_eq!(portal.settle().expect("settle"), GateChange::Discarded);
}

#[test]
fn same_user_gets_fresh_inbox_after_navbar_logout() {
    let mut portal = Portal::in_memory().expect("open portal");
    portal.login(admin()).expect("login");
    let mut navbar = portal.navbar(Arc::new(RecordingNavigator::default()));
    navbar.mark_all_read();
    assert_eq!(navbar.unread_count(), 0);

    navbar.logout();
    let change = portal.login(admin()).expect("login again");
    assert_eq!(change, GateChange::Loaded(UserId(1)));
    assert_eq!(portal.notifications().unread_count(), 2);

    assert!(navbar.refresh());
    assert!(navbar.view().logged_in);
    assert_eq!(navbar.notifications().len(), 4);
    assert_eq!(navbar.unread_count(), 2);
}

#[test]
fn unknown_notification_is_ignored_by_navbar() {
    let mut portal = Portal::in_memory().expect("open portal");
    portal.login(admin()).expect("login");
    let mut navbar = portal.navbar(Arc::new(RecordingNavigator::default()));

    navbar.mark_read(idea_portal::NotificationId(999));
    assert_eq!(navbar.unread_count(), 2);
}

// ---------------------------------------------------------------------------
// Category admin
// ---------------------------------------------------------------------------

#[test]
fn category_admin_flow() {
    let mut portal = Portal::in_memory().expect("open portal");
    portal.login(admin()).expect("login");
    let prompt = FixedPrompt::new(false);
    let mut screen = portal.category_screen(prompt.clone());

    screen.open_add_form();
    assert_eq!(screen.submit_form().expect("submit"), Some(FormOutcome::Rejected));
    assert_eq!(
        prompt.alerts.lock().unwrap().as_slice(),
        ["Category name is required"]
    );

    screen.form_mut().expect("form open").data.name = "Workplace".into();
    assert_eq!(screen.submit_form().expect("submit"), Some(FormOutcome::Saved));
    let category = screen.categories()[0].clone();

    assert!(!screen.delete_category(&category).expect("delete"));
    assert_eq!(screen.categories().len(), 1);

    screen.toggle_status(&category).expect("toggle");
    let stats = screen.stats();
    assert_eq!((stats.total, stats.active), (1, 0));
    assert_eq!(portal.categories().list().len(), 1);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn reopened_portal_restores_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let read_id;
    {
        let mut portal = Portal::builder()
            .data_dir(dir.path())
            .open()
            .expect("open portal");
        portal.login(admin()).expect("login");
        read_id = portal.notifications().notifications()[0].id;
        let mut screen = portal.category_screen(FixedPrompt::new(true));
        screen.open_add_form();
        screen.form_mut().expect("form open").data.name = "Growth".into();
        screen.submit_form().expect("submit");
        let mut navbar = portal.navbar(Arc::new(RecordingNavigator::default()));
        navbar.mark_read(read_id);
    }

    let mut portal = Portal::builder()
        .data_dir(dir.path())
        .open()
        .expect("reopen portal");
    assert_eq!(portal.categories().list()[0].name, "Growth");

    // Nobody is logged in after a restart, so the restored inbox is gone.
    assert!(portal.session().current_user().is_none());
    assert_eq!(portal.notifications().user_id(), None);
    let navbar = portal.navbar(Arc::new(RecordingNavigator::default()));
    assert!(!navbar.view().logged_in);
    assert!(navbar.notifications().is_empty());
    drop(navbar);

    assert_eq!(portal.login(admin()).expect("login"), GateChange::Loaded(UserId(1)));
    assert_eq!(portal.notifications().unread_count(), 2);
    assert!(
        portal
            .notifications()
            .notifications()
            .iter()
            .all(|n| n.id > read_id)
    );
}

// ---------------------------------------------------------------------------
// Async gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn follow_task_applies_session_changes() {
    let portal = Portal::in_memory().expect("open portal");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(portal.session_gate().follow(shutdown_rx));

    let mut inbox = portal.notifications().subscribe();
    portal.session().login(admin());
    let loaded = tokio::time::timeout(Duration::from_secs(1), inbox.changed())
        .await
        .expect("inbox loaded in time")
        .expect("store alive");
    assert_eq!(loaded.notifications.len(), 4);

    portal.session().logout();
    let discarded = tokio::time::timeout(Duration::from_secs(1), inbox.changed())
        .await
        .expect("inbox discarded in time")
        .expect("store alive");
    assert!(discarded.notifications.is_empty());

    shutdown_tx.send(true).expect("gate listening");
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("gate stopped")
        .expect("gate task");
}
