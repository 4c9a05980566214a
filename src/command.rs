//! Command metadata carried alongside every store command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cross-cutting metadata passed alongside a command.
///
/// Carries audit and correlation information without polluting the
/// `Command` or `DomainEvent` types. Fields are recorded on the
/// `execute` tracing span.
///
/// # Examples
///
/// ```
/// use idea_portal::CommandContext;
/// use serde_json::json;
///
/// let ctx = CommandContext::default()
///     .with_actor("user-42")
///     .with_correlation_id("navbar-click-7")
///     .with_metadata(json!({"source": "navbar"}));
///
/// assert_eq!(ctx.actor.as_deref(), Some("user-42"));
/// assert_eq!(ctx.correlation_id.as_deref(), Some("navbar-click-7"));
/// assert!(ctx.metadata.is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandContext {
    /// Identity of the actor issuing the command (e.g. a user ID).
    pub actor: Option<String>,
    /// Correlation ID for tracing one UI interaction across stores.
    pub correlation_id: Option<String>,
    /// Arbitrary metadata recorded with the command.
    pub metadata: Option<Value>,
}

impl CommandContext {
    /// Context for a command issued on behalf of a system component
    /// rather than a person (e.g. the session gate).
    pub fn system(component: &str) -> Self {
        Self::default().with_actor(format!("system:{component}"))
    }

    /// Set the actor identity.
    ///
    /// # Arguments
    ///
    /// * `actor` - Any value convertible to `String` identifying who issued
    ///   the command.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the correlation ID.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Set arbitrary metadata.
    pub fn with_metadata(mut self, meta: Value) -> Self {
        self.metadata = Some(meta);
        self
    }

    /// The actor as a log field, `"anonymous"` when unset.
    pub(crate) fn actor_label(&self) -> &str {
        self.actor.as_deref().unwrap_or("anonymous")
    }
}
