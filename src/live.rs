//! Observer registrations over store snapshots.
//!
//! A [`Subscription`] is the read side of a store: it always exposes the
//! latest full snapshot and remembers whether that snapshot has been seen.
//! Hosts either poll it after each UI event or await
//! [`changed`](Subscription::changed) from an async task.

use tokio::sync::watch;

use crate::projection::Projection;

/// A registered observer of a snapshot stream.
///
/// Created by [`StateStore::subscribe`](crate::StateStore::subscribe) or
/// [`Session::subscribe`](crate::Session::subscribe). The snapshot that is
/// current at registration time counts as already observed; use
/// [`current`](Subscription::current) to read it.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Clone of the latest snapshot, without marking it observed.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Returns the latest snapshot if it changed since the last observation
    /// and marks it observed.
    ///
    /// Returns `None` when nothing changed or the source has been dropped.
    pub fn poll(&mut self) -> Option<T> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            Ok(false) | Err(_) => None,
        }
    }

    /// Wait for the next change and return the new snapshot.
    ///
    /// Returns `None` once the source has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Compute a derived read model from the latest snapshot.
    pub fn project<P: Projection<T>>(&self) -> P {
        P::project(&self.rx.borrow())
    }

    /// `true` once the source store or session has been dropped.
    pub fn is_closed(&self) -> bool {
        self.rx.has_changed().is_err()
    }
}
