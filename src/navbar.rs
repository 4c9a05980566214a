//! Navbar presenter: auth-aware menus and the notification dropdown.
//!
//! The presenter reads the session and the notification store through
//! subscriptions registered in [`setup`](NavbarPresenter::setup), keeps its
//! own dropdown toggles, and forwards user actions to the stores. It never
//! mutates the notification collection itself.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::command::CommandContext;
use crate::feed::NotificationStore;
use crate::format::{DEFAULT_DATE_FORMAT, relative_time_with};
use crate::live::Subscription;
use crate::notification::{Inbox, Notification, NotificationId, NotificationKind, UnreadCount};
use crate::projection::Projection;
use crate::session::{AuthContext, User, UserRole};

/// Marker attribute on the user-menu dropdown root element.
pub const DROPDOWN_ROOT: &str = "data-dropdown-root";
/// Marker attribute on the notification dropdown root element.
pub const NOTIFICATION_DROPDOWN_ROOT: &str = "data-notification-dropdown";

/// Route changes requested by the presenter.
pub trait Navigator: Send + Sync {
    fn navigate_by_url(&self, url: &str);
}

/// Settings for [`NavbarPresenter`].
#[derive(Debug, Clone)]
pub struct NavbarConfig {
    /// Where logout sends the user.
    ///
    /// Default: `"/"`.
    pub landing_route: String,
    /// strftime pattern for notifications older than a week.
    ///
    /// Default: [`DEFAULT_DATE_FORMAT`].
    pub date_format: String,
}

impl Default for NavbarConfig {
    fn default() -> Self {
        Self {
            landing_route: "/".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// The ancestor chain of a pointer target, as marker attributes.
///
/// Built by the host from the clicked element up to the document root;
/// [`closest`](ElementPath::closest) is the scoped containment check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPath {
    markers: Vec<String>,
}

impl ElementPath {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// `true` if the target or one of its ancestors carries `marker`.
    pub fn closest(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }
}

/// Open/closed state of the two dropdowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropdownState {
    pub user_menu_open: bool,
    pub notifications_open: bool,
}

/// Everything the navbar template binds to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavbarView {
    pub logged_in: bool,
    pub user_name: Option<String>,
    pub role: Option<UserRole>,
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub dropdowns: DropdownState,
}

struct Subscriptions {
    user: Subscription<Option<User>>,
    inbox: Subscription<Inbox>,
}

/// Presenter behind the navigation bar.
pub struct NavbarPresenter {
    auth: Arc<dyn AuthContext>,
    notifications: NotificationStore,
    navigator: Arc<dyn Navigator>,
    config: NavbarConfig,
    subs: Option<Subscriptions>,
    view: NavbarView,
}

impl std::fmt::Debug for NavbarPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavbarPresenter")
            .field("active", &self.subs.is_some())
            .field("view", &self.view)
            .finish()
    }
}

impl NavbarPresenter {
    pub fn new(
        auth: Arc<dyn AuthContext>,
        notifications: NotificationStore,
        navigator: Arc<dyn Navigator>,
        config: NavbarConfig,
    ) -> Self {
        Self {
            auth,
            notifications,
            navigator,
            config,
            subs: None,
            view: NavbarView::default(),
        }
    }

    /// Register observers on the session and the notification store and
    /// render their current state. Calling it again is a no-op.
    pub fn setup(&mut self) {
        if self.subs.is_some() {
            return;
        }
        let subs = Subscriptions {
            user: self.auth.subscribe(),
            inbox: self.notifications.subscribe(),
        };
        self.render_user(subs.user.current());
        self.render_inbox(&subs.inbox.current());
        self.subs = Some(subs);
        tracing::debug!("navbar presenter set up");
    }

    /// Release every observer registered by [`setup`](NavbarPresenter::setup).
    pub fn teardown(&mut self) {
        if self.subs.take().is_some() {
            tracing::debug!("navbar presenter torn down");
        }
    }

    pub fn is_active(&self) -> bool {
        self.subs.is_some()
    }

    /// Pull pending snapshots into the view.
    ///
    /// # Returns
    ///
    /// `true` if anything changed and the navbar should re-render.
    pub fn refresh(&mut self) -> bool {
        let Some(subs) = self.subs.as_mut() else {
            return false;
        };
        let user = subs.user.poll();
        let inbox = subs.inbox.poll();
        let changed = user.is_some() || inbox.is_some();

        if let Some(user) = user {
            self.render_user(user);
        }
        if let Some(inbox) = inbox {
            self.render_inbox(&inbox);
        }
        changed
    }

    fn render_user(&mut self, user: Option<User>) {
        self.view.logged_in = user.is_some();
        self.view.role = user.as_ref().map(|u| u.role);
        self.view.user_name = user.map(|u| u.name);
    }

    fn render_inbox(&mut self, inbox: &Inbox) {
        self.view.unread_count = UnreadCount::project(inbox).0;
        self.view.notifications = inbox.notifications.clone();
    }

    pub fn view(&self) -> &NavbarView {
        &self.view
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.view.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.view.unread_count
    }

    pub fn dropdowns(&self) -> DropdownState {
        self.view.dropdowns
    }

    /// First letter of the trimmed user name, upper-cased; `"?"` without one.
    pub fn user_initial(&self) -> String {
        self.view
            .user_name
            .as_deref()
            .map(str::trim)
            .and_then(|name| name.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }

    pub fn is_admin(&self) -> bool {
        self.view.role == Some(UserRole::Admin)
    }

    pub fn is_manager(&self) -> bool {
        self.view.role == Some(UserRole::Manager)
    }

    pub fn is_employee(&self) -> bool {
        self.view.role == Some(UserRole::Employee)
    }

    pub fn notification_icon(&self, kind: NotificationKind) -> &'static str {
        kind.icon()
    }

    /// `"5m ago"`-style label for a notification, relative to now.
    pub fn relative_time(&self, notification: &Notification) -> String {
        self.relative_time_at(Utc::now(), notification)
    }

    pub fn relative_time_at(&self, now: DateTime<Utc>, notification: &Notification) -> String {
        relative_time_with(now, notification.created_at, &self.config.date_format)
    }

    // -- dropdowns ----------------------------------------------------------

    pub fn toggle_dropdown(&mut self) {
        let d = &mut self.view.dropdowns;
        d.user_menu_open = !d.user_menu_open;
    }

    /// Close the user menu. The notification dropdown closes with it.
    pub fn close_dropdown(&mut self) {
        self.view.dropdowns = DropdownState::default();
    }

    /// Opening the notification dropdown closes the user menu; opening the
    /// user menu leaves the notification dropdown alone.
    pub fn toggle_notification_dropdown(&mut self) {
        let d = &mut self.view.dropdowns;
        d.notifications_open = !d.notifications_open;
        if d.notifications_open {
            d.user_menu_open = false;
        }
    }

    pub fn close_notification_dropdown(&mut self) {
        self.view.dropdowns.notifications_open = false;
    }

    pub fn on_escape(&mut self) {
        self.close_dropdown();
        self.close_notification_dropdown();
    }

    /// Close each dropdown whose root does not contain the click target.
    pub fn on_document_click(&mut self, target: &ElementPath) {
        if !target.closest(DROPDOWN_ROOT) {
            self.view.dropdowns.user_menu_open = false;
        }
        if !target.closest(NOTIFICATION_DROPDOWN_ROOT) {
            self.close_notification_dropdown();
        }
    }

    // -- commands -----------------------------------------------------------

    fn ctx(&self) -> CommandContext {
        let ctx = CommandContext::default().with_metadata(serde_json::json!({"source": "navbar"}));
        match self.auth.current_user() {
            Some(user) => ctx.with_actor(user.id.to_string()),
            None => ctx,
        }
    }

    /// Mark one notification read. Unknown ids are logged and ignored.
    pub fn mark_read(&mut self, id: NotificationId) {
        if let Err(e) = self.notifications.mark_read(id, &self.ctx()) {
            tracing::warn!(notification_id = %id, error = %e, "mark read ignored");
        }
        self.refresh();
    }

    pub fn mark_all_read(&mut self) {
        if let Err(e) = self.notifications.mark_all_read(&self.ctx()) {
            tracing::warn!(error = %e, "mark all read failed");
        }
        self.refresh();
    }

    /// End the session, close both dropdowns and go to the landing route.
    pub fn logout(&mut self) {
        self.auth.logout();
        self.close_dropdown();
        self.navigator.navigate_by_url(&self.config.landing_route);
        self.refresh();
    }
}

impl Drop for NavbarPresenter {
    fn drop(&mut self) {
        self.teardown();
    }
}
