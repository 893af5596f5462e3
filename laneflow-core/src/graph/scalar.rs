//! Scalar Nodes
//!
//! Two scalar-valued node kinds share the [`ScalarSource`] pull interface:
//!
//! 1. [`ScalarLeaf`], a single externally mutable optional value. Setting
//!    it to the value it already holds is a no-op; setting a different
//!    value notifies observers without recomputing anything downstream.
//!
//! 2. [`ReduceNode`], a derived scalar folded from a block node: each
//!    present upstream block reduces to one partial result, and the present
//!    partials aggregate into the final value. Zero present blocks yield
//!    absence, never a computed zero.
//!
//! The reduction is generic over the reduced value's type, so the same
//! contract produces float aggregates (mean speed) or integer ones (count
//! of lanes past a threshold).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::store::Lane;

use super::node::{BlockSource, ScalarSource};
use super::observer::{Invalidation, ObserverFn, ObserverId, ObserverList};

/// An externally mutable scalar value.
pub struct ScalarLeaf<V: Lane> {
    value: Cell<Option<V>>,
    observers: RefCell<ObserverList>,
}

impl<V: Lane> ScalarLeaf<V> {
    /// Create a leaf with no value yet.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(None),
            observers: RefCell::new(ObserverList::new()),
        })
    }

    /// Create a leaf already holding `value`.
    pub fn with_value(value: V) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(Some(value)),
            observers: RefCell::new(ObserverList::new()),
        })
    }

    /// Set the value. No-op (no notification) if the leaf already holds an
    /// equal value; otherwise observers learn that everything derived from
    /// this scalar is stale.
    pub fn set(&self, value: V) {
        if self.value.get() == Some(value) {
            return;
        }
        self.value.set(Some(value));
        self.observers.borrow().notify(Invalidation::All);
    }

    /// Withdraw the value, returning the leaf to the absent state.
    pub fn clear(&self) {
        if self.value.get().is_none() {
            return;
        }
        self.value.set(None);
        self.observers.borrow().notify(Invalidation::All);
    }

    /// The current value, if any.
    pub fn get(&self) -> Option<V> {
        self.value.get()
    }
}

impl<V: Lane> ScalarSource<V> for ScalarLeaf<V> {
    fn recalculate(&self) -> Option<V> {
        self.value.get()
    }

    fn observe(&self, notify: ObserverFn) -> ObserverId {
        self.observers.borrow_mut().observe(notify)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().unobserve(id)
    }
}

impl<V: Lane> std::fmt::Debug for ScalarLeaf<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarLeaf")
            .field("value", &self.value.get())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

/// Reduces one lane block to one partial result.
pub type BlockReducer<T, R> = fn(&[T]) -> R;

/// Folds the present partial results into the final scalar. Never called
/// with an empty slice.
pub type Aggregator<R> = fn(&[R]) -> R;

/// A scalar derived by reducing a block node.
///
/// Caches one optional partial per upstream block index so a staleness
/// notification for one block re-reduces only that block; the aggregate is
/// re-folded from the cached partials.
pub struct ReduceNode<T: Lane, R: Lane> {
    input: Rc<dyn BlockSource<T>>,
    per_block: BlockReducer<T, R>,
    aggregate: Aggregator<R>,
    partials: RefCell<Vec<Option<R>>>,
    stale: RefCell<Vec<bool>>,
    result: Cell<Option<R>>,
    dirty: Cell<bool>,
    recomputes: Cell<u64>,
    observers: RefCell<ObserverList>,
}

impl<T: Lane, R: Lane> ReduceNode<T, R> {
    /// Create a reduction over `input`. The node adopts the input's block
    /// geometry, so no configuration can mismatch.
    pub fn new(
        input: Rc<dyn BlockSource<T>>,
        per_block: BlockReducer<T, R>,
        aggregate: Aggregator<R>,
    ) -> Rc<Self> {
        let block_count = input.layout().block_count();
        let node = Rc::new(Self {
            input: Rc::clone(&input),
            per_block,
            aggregate,
            partials: RefCell::new(vec![None; block_count]),
            stale: RefCell::new(vec![true; block_count]),
            result: Cell::new(None),
            dirty: Cell::new(true),
            recomputes: Cell::new(0),
            observers: RefCell::new(ObserverList::new()),
        });

        let weak = Rc::downgrade(&node);
        input.observe(Box::new(move |invalidation| {
            if let Some(node) = weak.upgrade() {
                node.invalidate(invalidation);
            }
        }));

        node
    }

    /// Number of times the aggregate has been re-folded. Diagnostic for
    /// tests and instrumentation.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.get()
    }

    fn invalidate(&self, invalidation: Invalidation) {
        let newly = {
            let mut stale = self.stale.borrow_mut();
            match invalidation {
                Invalidation::Block(block) => {
                    let newly = !stale[block];
                    stale[block] = true;
                    newly
                }
                Invalidation::All => {
                    let mut newly = false;
                    for flag in stale.iter_mut() {
                        newly |= !*flag;
                        *flag = true;
                    }
                    newly
                }
            }
        };
        if newly {
            self.dirty.set(true);
            // Downstream of a scalar there is no per-block granularity.
            self.observers.borrow().notify(Invalidation::All);
        }
    }
}

impl<T: Lane, R: Lane> ScalarSource<R> for ReduceNode<T, R> {
    fn recalculate(&self) -> Option<R> {
        if !self.dirty.get() {
            return self.result.get();
        }

        let block_count = self.input.layout().block_count();
        for block in 0..block_count {
            if !self.stale.borrow()[block] {
                continue;
            }
            self.input.recalculate_block(block);
            let partial = self
                .input
                .try_get_block(block)
                .map(|lanes| (self.per_block)(&lanes));
            self.partials.borrow_mut()[block] = partial;
            self.stale.borrow_mut()[block] = false;
        }

        let present: SmallVec<[R; 8]> =
            self.partials.borrow().iter().filter_map(|p| *p).collect();
        let result = if present.is_empty() {
            trace!("reduction has no present upstream blocks");
            None
        } else {
            Some((self.aggregate)(&present))
        };

        self.result.set(result);
        self.dirty.set(false);
        self.recomputes.set(self.recomputes.get() + 1);
        result
    }

    fn observe(&self, notify: ObserverFn) -> ObserverId {
        self.observers.borrow_mut().observe(notify)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().unobserve(id)
    }
}

impl<T: Lane, R: Lane> std::fmt::Debug for ReduceNode<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReduceNode")
            .field("dirty", &self.dirty.get())
            .field("result", &self.result.get())
            .field("recomputes", &self.recomputes.get())
            .finish()
    }
}
