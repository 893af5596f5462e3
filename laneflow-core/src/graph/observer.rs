//! Staleness Observers
//!
//! When a leaf is written or a scalar changes, downstream nodes must learn
//! that their cached blocks are stale, cheaply, without recomputing
//! anything. Each node owns an explicit observer list; a downstream node
//! registers an invalidation callback at construction and is notified with
//! the scope of what went stale.
//!
//! Callbacks capture only `Weak` references to their targets, so an
//! upstream node never keeps a dropped consumer alive and the graph's
//! edges all point upstream.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

/// Unique identifier for a registered observer.
///
/// Used to deduplicate registrations and to remove a callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Generate a new unique observer ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// The scope of a staleness notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// One block's cached data went stale.
    Block(usize),
    /// Every block went stale (a scalar operand changed).
    All,
}

/// An invalidation callback. Single-threaded by contract, so plain `Fn`
/// with no `Send`/`Sync` bounds.
pub type ObserverFn = Box<dyn Fn(Invalidation)>;

/// An ordered registry of invalidation callbacks.
///
/// Notification runs in registration order, which keeps staleness cascades
/// deterministic across runs.
#[derive(Default)]
pub struct ObserverList {
    observers: IndexMap<ObserverId, ObserverFn>,
}

impl ObserverList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            observers: IndexMap::new(),
        }
    }

    /// Register a callback; returns the ID needed to remove it.
    pub fn observe(&mut self, notify: ObserverFn) -> ObserverId {
        let id = ObserverId::new();
        self.observers.insert(id, notify);
        id
    }

    /// Remove a callback. Returns `false` if the ID was not registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.shift_remove(&id).is_some()
    }

    /// Notify every observer of `invalidation`, in registration order.
    pub fn notify(&self, invalidation: Invalidation) {
        for notify in self.observers.values() {
            notify(invalidation);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}
