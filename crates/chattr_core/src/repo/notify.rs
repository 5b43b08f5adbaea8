//! Change notification sink.
//!
//! # Responsibility
//! - Keep an ordered observer list per store.
//! - Fan out committed mutations to observers without letting one observer
//!   affect the store or the others.
//!
//! # Invariants
//! - Dispatch never runs while a store lock is held.
//! - A panicking observer is counted and logged, never propagated.
//! - Observers see each event at most once; there is no retry.

use crate::logging::panic_payload_text;
use log::warn;
use parking_lot::RwLock;
use std::fmt::{Debug, Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Mutation kind delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Add,
    Propose,
    Approve,
    Edit,
    Delete,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Propose => "propose",
            Self::Approve => "approve",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl Display for ChangeAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by `subscribe`, usable with `unsubscribe`.
pub type SubscriptionId = u64;

type Callback<T> = Arc<dyn Fn(ChangeAction, &T) + Send + Sync>;

/// Outcome of one best-effort fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered observer list.
pub struct ChangeNotifier<T> {
    subscribers: RwLock<Vec<(SubscriptionId, Callback<T>)>>,
    next_subscription: AtomicU64,
}

impl<T> ChangeNotifier<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Registers an observer; observers run in registration order.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(ChangeAction, &T) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Removes an observer. Returns `false` for an unknown handle.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Invokes every observer once, catching panics per observer.
    ///
    /// Works on a snapshot of the list so observers may subscribe or
    /// re-enter the owning store.
    pub fn notify_best_effort(&self, action: ChangeAction, record: &T) -> DispatchReport {
        let snapshot: Vec<(SubscriptionId, Callback<T>)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        let mut report = DispatchReport::default();
        for (id, callback) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(action, record))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        "event=change_notify module=repo status=error action={} subscription={} payload={}",
                        action,
                        id,
                        panic_payload_text(payload.as_ref())
                    );
                }
            }
        }
        report
    }
}

impl<T> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for ChangeNotifier<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.len())
            .finish()
    }
}
