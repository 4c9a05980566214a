//! Single-writer state store that publishes full snapshots to subscribers.
//!
//! A [`StateStore`] owns one aggregate state. Commands are decided by the
//! aggregate, folded into the next state, optionally persisted as a
//! snapshot, and then published to every [`Subscription`]. The store is
//! opened via [`StateStoreBuilder`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::watch;

use crate::aggregate::Aggregate;
use crate::command::CommandContext;
use crate::error::ExecuteError;
use crate::live::Subscription;
use crate::projection::Projection;
use crate::snapshot::{Snapshot, load_snapshot, save_snapshot};

/// Instance ID used when the builder is not given one.
const DEFAULT_INSTANCE_ID: &str = "default";

struct Inner<A: Aggregate> {
    tx: watch::Sender<A>,
    version: AtomicU64,
    snapshot_dir: Option<PathBuf>,
    instance_id: String,
}

/// Handle to a running aggregate store.
///
/// `Clone` is cheap: all clones share the same state, so a presenter and
/// the component that gates it can hold the same store.
///
/// # Type Parameters
///
/// * `A` - The [`Aggregate`] type this store owns.
pub struct StateStore<A: Aggregate> {
    inner: Arc<Inner<A>>,
}

// Manual `Clone` because `A` need not be cloned to clone the handle.
impl<A: Aggregate> Clone for StateStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Manual `Debug` to avoid dumping the whole state into logs.
impl<A: Aggregate> std::fmt::Debug for StateStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("aggregate_type", &A::AGGREGATE_TYPE)
            .field("instance_id", &self.inner.instance_id)
            .field("version", &self.version())
            .finish()
    }
}

impl<A: Aggregate> StateStore<A> {
    /// Start configuring a new store.
    pub fn builder() -> StateStoreBuilder<A> {
        StateStoreBuilder::new()
    }

    /// Open an in-memory store starting from `A::default()`.
    pub fn in_memory() -> Self {
        Self::from_parts(A::default(), 0, None, DEFAULT_INSTANCE_ID.to_string())
    }

    fn from_parts(
        state: A,
        version: u64,
        snapshot_dir: Option<PathBuf>,
        instance_id: String,
    ) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            inner: Arc::new(Inner {
                tx,
                version: AtomicU64::new(version),
                snapshot_dir,
                instance_id,
            }),
        }
    }

    /// Execute a command against the current state.
    ///
    /// The aggregate decides which events the command produces; the events
    /// are folded into the next state, which is saved (when persistence is
    /// configured) and then published to all subscribers. Executions are
    /// serialized, so no observer ever sees a half-applied command.
    ///
    /// A command that produces no events leaves the state untouched and
    /// notifies nobody.
    ///
    /// # Returns
    ///
    /// The domain events produced by the command.
    ///
    /// # Errors
    ///
    /// * [`ExecuteError::Domain`] -- the aggregate rejected the command.
    /// * [`ExecuteError::Io`] -- saving the snapshot failed; nothing was published.
    pub fn execute(
        &self,
        cmd: A::Command,
        ctx: &CommandContext,
    ) -> Result<Vec<A::DomainEvent>, ExecuteError<A::Error>> {
        let _span = tracing::info_span!(
            "execute",
            aggregate_type = A::AGGREGATE_TYPE,
            actor = ctx.actor_label(),
            correlation_id = ctx.correlation_id.as_deref().unwrap_or_default(),
        )
        .entered();

        let mut outcome = Ok(Vec::new());
        self.inner.tx.send_if_modified(|state| {
            let events = match state.handle(cmd) {
                Ok(events) => events,
                Err(e) => {
                    outcome = Err(ExecuteError::Domain(e));
                    return false;
                }
            };
            if events.is_empty() {
                return false;
            }

            let next = events
                .iter()
                .fold(state.clone(), |state, event| state.apply(event));
            let version = self.inner.version.load(Ordering::Acquire) + events.len() as u64;

            if let Some(dir) = &self.inner.snapshot_dir {
                let snapshot = Snapshot {
                    state: next,
                    version,
                    saved_at: Utc::now(),
                };
                if let Err(e) = save_snapshot::<A>(dir, &self.inner.instance_id, &snapshot) {
                    outcome = Err(ExecuteError::Io(e));
                    return false;
                }
                *state = snapshot.state;
            } else {
                *state = next;
            }

            self.inner.version.store(version, Ordering::Release);
            outcome = Ok(events);
            true
        });

        match &outcome {
            Ok(events) if !events.is_empty() => {
                tracing::info!(count = events.len(), "events applied");
            }
            Ok(_) => tracing::debug!("command was a no-op"),
            Err(e) => tracing::debug!(error = %e, "command rejected"),
        }
        outcome
    }

    /// Clone of the current state.
    pub fn state(&self) -> A {
        self.inner.tx.borrow().clone()
    }

    /// Compute a derived read model from the current state.
    pub fn project<P: Projection<A>>(&self) -> P {
        P::project(&self.inner.tx.borrow())
    }

    /// Register a new observer of this store's snapshots.
    pub fn subscribe(&self) -> Subscription<A> {
        tracing::debug!(
            aggregate_type = A::AGGREGATE_TYPE,
            observers = self.inner.tx.receiver_count() + 1,
            "observer registered"
        );
        Subscription::new(self.inner.tx.subscribe())
    }

    /// Number of events applied since the store was first created.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

/// Builder for configuring and opening a [`StateStore`].
///
/// # Examples
///
/// ```no_run
/// use idea_portal::{Catalog, StateStore};
///
/// # fn example() -> std::io::Result<()> {
/// let store = StateStore::<Catalog>::builder()
///     .snapshot_dir("/var/lib/idea-portal")
///     .instance_id("default")
///     .open()?;
/// # Ok(())
/// # }
/// ```
pub struct StateStoreBuilder<A: Aggregate> {
    initial_state: Option<A>,
    snapshot_dir: Option<PathBuf>,
    instance_id: String,
}

impl<A: Aggregate> StateStoreBuilder<A> {
    /// Create a builder for an in-memory store starting from `A::default()`.
    pub fn new() -> Self {
        Self {
            initial_state: None,
            snapshot_dir: None,
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
        }
    }

    /// State to start from when no snapshot exists.
    pub fn initial_state(mut self, state: A) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Persist every change under `dir` and restore from it on open.
    pub fn snapshot_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.snapshot_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Distinguishes several stores of the same aggregate type sharing a
    /// snapshot directory.
    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    /// Open the store, restoring the last snapshot if persistence is on.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the snapshot directory cannot be created or
    /// an existing snapshot cannot be read.
    pub fn open(self) -> io::Result<StateStore<A>> {
        let initial = self.initial_state.unwrap_or_default();
        let Some(dir) = self.snapshot_dir else {
            return Ok(StateStore::from_parts(initial, 0, None, self.instance_id));
        };

        std::fs::create_dir_all(&dir)?;
        let (state, version) = match load_snapshot::<A>(&dir, &self.instance_id)? {
            Some(snap) => {
                tracing::info!(
                    aggregate_type = A::AGGREGATE_TYPE,
                    instance_id = %self.instance_id,
                    version = snap.version,
                    "restored snapshot"
                );
                (snap.state, snap.version)
            }
            None => (initial, 0),
        };
        Ok(StateStore::from_parts(
            state,
            version,
            Some(dir),
            self.instance_id,
        ))
    }
}

impl<A: Aggregate> Default for StateStoreBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}
