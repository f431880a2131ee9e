//! Observer pattern for job status changes.
//!
//! Observers decide for themselves when to stop listening: returning
//! [`ObserverControl::Detach`] from a notification removes the observer,
//! so a completion handler can fire exactly once for its terminal transition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::job::ComputationJob;

/// What an observer wants after handling a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverControl {
    Keep,
    Detach,
}

/// Observer trait for receiving job status changes.
pub trait StatusObserver: Send + Sync {
    /// Called after the job's status changed.
    fn on_status_changed(&self, job: &ComputationJob) -> ObserverControl;
}

/// Handle returned by [`StatusSubject::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subject that manages a collection of observers.
pub struct StatusSubject {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn StatusObserver>)>>,
    next_id: AtomicU64,
}

impl StatusSubject {
    /// Create a new subject with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register an observer.
    pub fn register(&self, observer: Arc<dyn StatusObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Unregister one observer. Returns whether it was registered.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    /// Unregister all observers.
    pub fn clear(&self) {
        self.observers.write().clear();
    }

    /// Notify all observers, dropping those that ask to detach.
    ///
    /// The observer list is snapshotted first, so observers may
    /// (un)register during the callback without deadlocking.
    pub fn notify(&self, job: &ComputationJob) {
        let snapshot: Vec<_> = self.observers.read().clone();
        let detached: Vec<SubscriptionId> = snapshot
            .iter()
            .filter(|(_, observer)| observer.on_status_changed(job) == ObserverControl::Detach)
            .map(|(id, _)| *id)
            .collect();
        if !detached.is_empty() {
            self.observers
                .write()
                .retain(|(id, _)| !detached.contains(id));
        }
    }

    /// Get the number of registered observers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.observers.read().len()
    }
}

impl Default for StatusSubject {
    fn default() -> Self {
        Self::new()
    }
}
