//! Crate-level error types for command execution and store opening.

/// Error returned when executing a command against a [`StateStore`](crate::StateStore) fails.
///
/// Generic over `E`, the domain-specific error type that the aggregate's
/// command handler may produce (e.g., "category name is required").
///
/// # Type Parameters
///
/// * `E` - Domain error type, must implement `Error + Send + Sync + 'static`
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError<E: std::error::Error + Send + Sync + 'static> {
    /// Command rejected by aggregate logic.
    ///
    /// Wraps the domain-specific error returned from the aggregate's
    /// command handler, forwarding its `Display` and `Error` impls.
    #[error(transparent)]
    Domain(E),

    /// Snapshot persistence failed.
    ///
    /// The new state was not published; observers still see the
    /// previous snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl<E: std::error::Error + Send + Sync + 'static> ExecuteError<E> {
    /// Returns the domain error if the command was rejected by the aggregate.
    pub fn domain(&self) -> Option<&E> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Io(_) => None,
        }
    }
}

/// Error returned when opening the [`Portal`](crate::Portal) fails.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// A store could not restore its snapshot or create its directory.
    #[error("failed to open {store} store: {source}")]
    Open {
        /// Aggregate type of the store that failed to open.
        store: &'static str,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configured date format is not a valid strftime pattern.
    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    /// Applying the restored session state to the inbox failed.
    #[error("failed to sync session with inbox: {0}")]
    Session(#[source] ExecuteError<crate::notification::InboxError>),
}
