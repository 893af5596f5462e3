//! Node Contracts
//!
//! Mutable leaves and derived nodes are distinct types behind two shared
//! pull interfaces: [`BlockSource`] for block-valued nodes and
//! [`ScalarSource`] for scalar-valued ones. Downstream nodes hold shared
//! `Rc<dyn BlockSource<T>>` / `Rc<dyn ScalarSource<T>>` references for the
//! graph's lifetime and never reference their own consumers, so a
//! constructed graph is acyclic by construction.
//!
//! # Pull semantics
//!
//! `recalculate_*` is the freshness entry point: it brings the node's
//! cached data up to date with its inputs, recursing upstream as needed,
//! and reports presence. `try_get_block` and `read_lane` expose whatever is
//! currently cached without recomputing; callers pull first, then read.

use std::cell::Ref;

use crate::store::{BlockLayout, Lane, Presence};

use super::observer::{ObserverFn, ObserverId};

/// A block-valued node: a mutable leaf or a derived node.
pub trait BlockSource<T: Lane> {
    /// The block geometry this node shares with its subgraph.
    fn layout(&self) -> BlockLayout;

    /// Bring the cached block at `block` up to date and report whether it
    /// holds data. Absence is an expected outcome, not an error.
    fn recalculate_block(&self, block: usize) -> Presence;

    /// Borrow the cached lanes at `block`, or `None` when absent.
    ///
    /// Does not recompute; pull with [`BlockSource::recalculate_block`]
    /// first when freshness matters.
    fn try_get_block(&self, block: usize) -> Option<Ref<'_, [T]>>;

    /// Read one cached lane without recomputing. A present but unwritten
    /// lane reads as the fill value; `None` means the lane's block is
    /// absent.
    fn read_lane(&self, entity: usize) -> Option<T> {
        let addr = self.layout().locate(entity);
        self.try_get_block(addr.block).map(|lanes| lanes[addr.lane])
    }

    /// Register a staleness observer; returns the ID needed to remove it.
    fn observe(&self, notify: ObserverFn) -> ObserverId;

    /// Remove a previously registered observer.
    fn unobserve(&self, id: ObserverId) -> bool;
}

/// A scalar-valued node: a mutable scalar leaf or a reduction over a block
/// node.
pub trait ScalarSource<V: Lane> {
    /// Bring the cached value up to date and return it; `None` means no
    /// value yet.
    fn recalculate(&self) -> Option<V>;

    /// Register a staleness observer; returns the ID needed to remove it.
    fn observe(&self, notify: ObserverFn) -> ObserverId;

    /// Remove a previously registered observer.
    fn unobserve(&self, id: ObserverId) -> bool;
}
