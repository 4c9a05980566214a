//! Composition root: opens every store and hands out presenters.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::admin::{CategoryListScreen, Prompt};
use crate::aggregate::Aggregate;
use crate::category::{Catalog, StoreCategoryRepository};
use crate::command::CommandContext;
use crate::error::{ExecuteError, PortalError};
use crate::feed::{GateChange, NotificationSource, NotificationStore, SeedSource, SessionGate};
use crate::format::{DEFAULT_DATE_FORMAT, is_valid_date_format};
use crate::live::Subscription;
use crate::navbar::{NavbarConfig, NavbarPresenter, Navigator};
use crate::notification::{Inbox, InboxError};
use crate::session::{AuthContext, Session, User};
use crate::store::StateStore;

/// Settings for [`Portal`].
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Directory for store snapshots. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Route the navbar navigates to on logout.
    pub landing_route: String,
    /// strftime pattern for notification dates older than a week.
    pub date_format: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            landing_route: "/".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl PortalConfig {
    fn navbar(&self) -> NavbarConfig {
        NavbarConfig {
            landing_route: self.landing_route.clone(),
            date_format: self.date_format.clone(),
        }
    }
}

/// Builder for [`Portal`].
///
/// # Examples
///
/// ```
/// use idea_portal::{Portal, User, UserRole};
///
/// let mut portal = Portal::builder().landing_route("/login").open().unwrap();
/// portal.login(User::new(1, "Alice", UserRole::Admin)).unwrap();
/// assert_eq!(portal.notifications().unread_count(), 2);
/// ```
pub struct PortalBuilder {
    config: PortalConfig,
    source: Arc<dyn NotificationSource>,
}

impl PortalBuilder {
    fn new() -> Self {
        Self {
            config: PortalConfig::default(),
            source: Arc::new(SeedSource),
        }
    }

    /// Persist store snapshots under `dir`.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    pub fn landing_route(mut self, route: impl Into<String>) -> Self {
        self.config.landing_route = route.into();
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.date_format = format.into();
        self
    }

    /// Replace the seed notifications loaded at login.
    pub fn notification_source(mut self, source: Arc<dyn NotificationSource>) -> Self {
        self.source = source;
        self
    }

    /// Use a complete [`PortalConfig`].
    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = config;
        self
    }

    /// Open every store, restoring snapshots when a data directory is set.
    ///
    /// The session starts logged out, so a restored inbox is discarded
    /// until somebody logs in.
    pub fn open(self) -> Result<Portal, PortalError> {
        if !is_valid_date_format(&self.config.date_format) {
            return Err(PortalError::InvalidDateFormat(self.config.date_format));
        }
        let inbox = open_store::<Inbox>(&self.config)?;
        let catalog = open_store::<Catalog>(&self.config)?;

        let session = Session::new();
        let notifications = NotificationStore::new(inbox, self.source);
        let mut gate = SessionGate::new(&session, notifications.clone());
        gate.sync().map_err(PortalError::Session)?;

        info!(
            persistent = self.config.data_dir.is_some(),
            categories = catalog.state().categories.len(),
            "portal opened"
        );

        Ok(Portal {
            config: self.config,
            session,
            notifications,
            categories: StoreCategoryRepository::new(catalog),
            gate,
        })
    }
}

fn open_store<A: Aggregate>(config: &PortalConfig) -> Result<StateStore<A>, PortalError> {
    let mut builder = StateStore::<A>::builder();
    if let Some(dir) = &config.data_dir {
        builder = builder.snapshot_dir(dir);
    }
    builder.open().map_err(|source| PortalError::Open {
        store: A::AGGREGATE_TYPE,
        source,
    })
}

/// Session handle given to presenters: logging out also discards the
/// inbox, without waiting for the gate.
#[derive(Debug, Clone)]
struct GatedSession {
    session: Session,
    notifications: NotificationStore,
}

impl AuthContext for GatedSession {
    fn subscribe(&self) -> Subscription<Option<User>> {
        self.session.subscribe()
    }

    fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    fn logout(&self) {
        self.session.logout();
        if let Err(e) = self.notifications.discard(&CommandContext::system("logout")) {
            tracing::warn!(error = %e, "inbox discard on logout failed");
        }
    }
}

/// The wired-up application: session, notification inbox, category
/// catalog, and the gate between session and inbox.
pub struct Portal {
    config: PortalConfig,
    session: Session,
    notifications: NotificationStore,
    categories: StoreCategoryRepository,
    gate: SessionGate,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

impl Portal {
    pub fn builder() -> PortalBuilder {
        PortalBuilder::new()
    }

    /// Open an in-memory portal with default settings.
    pub fn in_memory() -> Result<Self, PortalError> {
        Self::builder().open()
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn categories(&self) -> &StoreCategoryRepository {
        &self.categories
    }

    /// Log `user` in and load their inbox.
    pub fn login(&mut self, user: User) -> Result<GateChange, ExecuteError<InboxError>> {
        self.session.login(user);
        self.settle()
    }

    /// Log out and discard the inbox.
    pub fn logout(&mut self) -> Result<GateChange, ExecuteError<InboxError>> {
        self.session.logout();
        self.settle()
    }

    /// Apply pending session changes to the inbox.
    ///
    /// Hosts that do not run [`session_gate`](Portal::session_gate) on a
    /// task call this after anything that may have changed the session.
    pub fn settle(&mut self) -> Result<GateChange, ExecuteError<InboxError>> {
        self.gate.sync()
    }

    /// A separate gate for [`SessionGate::follow`] on an async task.
    pub fn session_gate(&self) -> SessionGate {
        SessionGate::new(&self.session, self.notifications.clone())
    }

    /// A navbar presenter wired to this portal, already set up.
    ///
    /// Its logout discards the inbox right away; a later
    /// [`settle`](Portal::settle) or [`login`](Portal::login) sees the
    /// logout as well.
    pub fn navbar(&self, navigator: Arc<dyn Navigator>) -> NavbarPresenter {
        let auth = GatedSession {
            session: self.session.clone(),
            notifications: self.notifications.clone(),
        };
        let mut navbar = NavbarPresenter::new(
            Arc::new(auth),
            self.notifications.clone(),
            navigator,
            self.config.navbar(),
        );
        navbar.setup();
        navbar
    }

    /// The category admin screen, acting as the logged-in user.
    pub fn category_screen(
        &self,
        prompt: Arc<dyn Prompt>,
    ) -> CategoryListScreen<StoreCategoryRepository> {
        let repo = match self.session.current_user() {
            Some(user) => self.categories.clone().with_actor(user.id.to_string()),
            None => self.categories.clone(),
        };
        CategoryListScreen::new(repo, prompt)
    }
}
