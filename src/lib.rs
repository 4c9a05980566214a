//! State stores and presenters for an idea-management portal.
//!
//! Every collection lives in a [`StateStore`]: commands are decided by an
//! [`Aggregate`], folded into a new snapshot, optionally persisted, and
//! published to [`Subscription`]s. On top of that sit the notification
//! inbox with its session gate, the navbar presenter, and the category
//! admin screens, all wired together by [`Portal`].

mod admin;
mod aggregate;
mod category;
mod command;
mod error;
mod feed;
pub mod format;
mod live;
mod navbar;
mod notification;
mod portal;
mod projection;
mod session;
mod snapshot;
mod store;

pub use admin::{
    AVAILABLE_COLORS, AVAILABLE_ICONS, CategoryForm, CategoryListScreen, FormOutcome, Prompt,
};
pub use aggregate::Aggregate;
pub use category::{
    Catalog, CatalogCommand, CatalogError, CatalogEvent, CatalogResult, Category, CategoryDraft,
    CategoryId, CategoryRepository, CategoryStats, DEFAULT_COLOR, DEFAULT_ICON,
    StoreCategoryRepository,
};
pub use command::CommandContext;
pub use error::{ExecuteError, PortalError};
pub use feed::{
    GateChange, InboxResult, NotificationSource, NotificationStore, SeedSource, SessionGate,
};
pub use live::Subscription;
pub use navbar::{
    DROPDOWN_ROOT, DropdownState, ElementPath, NOTIFICATION_DROPDOWN_ROOT, NavbarConfig,
    NavbarPresenter, NavbarView, Navigator,
};
pub use notification::{
    Inbox, InboxCommand, InboxError, InboxEvent, NewNotification, Notification, NotificationId,
    NotificationKind, NotificationStatus, UnreadCount,
};
pub use portal::{Portal, PortalBuilder, PortalConfig};
pub use projection::Projection;
pub use session::{AuthContext, Session, User, UserId, UserRole};
pub use snapshot::{Snapshot, load_snapshot, save_snapshot, snapshot_path};
pub use store::{StateStore, StateStoreBuilder};
