//! Mutable Block Leaf
//!
//! A `BlockLeaf` is an externally written block node: the roots of a
//! dataflow graph. Gameplay systems write per-entity values into it every
//! tick; derived nodes read from it on demand.
//!
//! # Staleness on write
//!
//! A write that actually changes the store (a differing lane value, or the
//! allocation of a previously absent block) marks the block stale and
//! notifies observers with the block's index; nothing downstream
//! recomputes until it is pulled. A write that changes nothing notifies
//! nobody, so redundant per-tick writes are free.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::store::{BlockAddr, BlockLayout, Lane, Presence, SparseBlockStore};

use super::config::GraphConfig;
use super::node::BlockSource;
use super::observer::{Invalidation, ObserverFn, ObserverId, ObserverList};

/// An externally written block node.
pub struct BlockLeaf<T: Lane> {
    store: RefCell<SparseBlockStore<T>>,
    observers: RefCell<ObserverList>,
}

impl<T: Lane> BlockLeaf<T> {
    /// Create a leaf from the subgraph's shared configuration.
    pub fn new(config: GraphConfig<T>) -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(config.build_store()),
            observers: RefCell::new(ObserverList::new()),
        })
    }

    /// Write one entity's value.
    ///
    /// No-op (no staleness, no notification) when the lane already holds
    /// `value`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is outside the leaf's capacity.
    pub fn set(&self, entity: usize, value: T) {
        let (changed, block) = {
            let mut store = self.store.borrow_mut();
            let addr = store.locate(entity);
            (store.write_at(addr, value), addr.block)
        };
        if changed {
            trace!(entity, block, "leaf write, cascading staleness");
            self.observers.borrow().notify(Invalidation::Block(block));
        }
    }

    /// Read one entity's value. `None` means the entity's block is absent.
    pub fn get(&self, entity: usize) -> Option<T> {
        self.store.borrow().read_lane(entity)
    }

    /// A read/write handle with the entity's address pre-resolved, for hot
    /// per-entity code paths.
    pub fn handle(self: &Rc<Self>, entity: usize) -> LaneHandle<T> {
        let addr = self.store.borrow().locate(entity);
        LaneHandle {
            leaf: Rc::clone(self),
            addr,
        }
    }
}

impl<T: Lane> BlockSource<T> for BlockLeaf<T> {
    fn layout(&self) -> BlockLayout {
        self.store.borrow().layout()
    }

    /// A leaf is always fresh: reports the block's presence.
    fn recalculate_block(&self, block: usize) -> Presence {
        self.store.borrow().presence(block)
    }

    fn try_get_block(&self, block: usize) -> Option<Ref<'_, [T]>> {
        Ref::filter_map(self.store.borrow(), |store| store.block(block)).ok()
    }

    fn observe(&self, notify: ObserverFn) -> ObserverId {
        self.observers.borrow_mut().observe(notify)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().unobserve(id)
    }
}

impl<T: Lane> std::fmt::Debug for BlockLeaf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.store.borrow();
        f.debug_struct("BlockLeaf")
            .field("layout", &store.layout())
            .field("present_blocks", &store.present_block_count())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

/// A leaf lane with its address translation done once.
///
/// Holds the leaf alive; writes go through the same identity short-circuit
/// and staleness notification as [`BlockLeaf::set`].
#[derive(Debug, Clone)]
pub struct LaneHandle<T: Lane> {
    leaf: Rc<BlockLeaf<T>>,
    addr: BlockAddr,
}

impl<T: Lane> LaneHandle<T> {
    /// The pre-resolved (block, lane) coordinate.
    pub fn addr(&self) -> BlockAddr {
        self.addr
    }

    /// Read the lane. `None` means its block is absent.
    pub fn get(&self) -> Option<T> {
        self.leaf.store.borrow().read_at(self.addr)
    }

    /// Write the lane. No-op when it already holds `value`.
    pub fn set(&self, value: T) {
        let changed = self.leaf.store.borrow_mut().write_at(self.addr, value);
        if changed {
            self.leaf
                .observers
                .borrow()
                .notify(Invalidation::Block(self.addr.block));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn config() -> GraphConfig<f32> {
        GraphConfig::new(64, 0.0)
    }

    #[test]
    fn read_after_write_returns_value() {
        let leaf = BlockLeaf::new(config());
        leaf.set(7, 3.25);
        assert_eq!(leaf.get(7), Some(3.25));
    }

    #[test]
    fn read_after_write_across_block_boundary() {
        let leaf = BlockLeaf::new(config());
        leaf.set(15, 1.0);
        leaf.set(16, 2.0);
        assert_eq!(leaf.get(15), Some(1.0));
        assert_eq!(leaf.get(16), Some(2.0));
    }

    #[test]
    fn unwritten_entity_in_absent_block_reads_none() {
        let leaf = BlockLeaf::new(config());
        leaf.set(0, 1.0);
        assert_eq!(leaf.get(17), None);
    }

    #[test]
    fn unwritten_lane_in_present_block_reads_fill() {
        let leaf = BlockLeaf::new(GraphConfig::new(64, -5.0));
        leaf.set(0, 1.0);
        assert_eq!(leaf.get(1), Some(-5.0));
    }

    #[test]
    fn write_notifies_observers_with_block_index() {
        let leaf = BlockLeaf::new(config());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = Rc::clone(&seen);
        leaf.observe(Box::new(move |inv| seen_clone.borrow_mut().push(inv)));

        leaf.set(17, 1.0);
        assert_eq!(&*seen.borrow(), &[Invalidation::Block(1)]);
    }

    #[test]
    fn redundant_write_does_not_notify() {
        let leaf = BlockLeaf::new(config());
        leaf.set(3, 2.0);

        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        leaf.observe(Box::new(move |_| count_clone.set(count_clone.get() + 1)));

        leaf.set(3, 2.0);
        assert_eq!(count.get(), 0);

        leaf.set(3, 2.5);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn leaf_recalculate_reports_presence() {
        let leaf = BlockLeaf::new(config());
        assert_eq!(leaf.recalculate_block(0), Presence::Absent);
        leaf.set(0, 1.0);
        assert_eq!(leaf.recalculate_block(0), Presence::Present);
        assert_eq!(leaf.recalculate_block(1), Presence::Absent);
    }

    #[test]
    fn handle_reads_and_writes_like_the_leaf() {
        let leaf = BlockLeaf::new(config());
        let handle = leaf.handle(20);

        assert_eq!(handle.get(), None);
        handle.set(4.5);
        assert_eq!(handle.get(), Some(4.5));
        assert_eq!(leaf.get(20), Some(4.5));
        assert_eq!(handle.addr(), BlockAddr { block: 1, lane: 4 });
    }

    #[test]
    fn handle_write_has_identity_short_circuit() {
        let leaf = BlockLeaf::new(config());
        let handle = leaf.handle(2);
        handle.set(1.0);

        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        leaf.observe(Box::new(move |_| count_clone.set(count_clone.get() + 1)));

        handle.set(1.0);
        assert_eq!(count.get(), 0);
    }
}
