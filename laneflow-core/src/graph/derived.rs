//! Derived Block Nodes
//!
//! A derived node recomputes one block at a time from 1–3 upstream block
//! nodes and optionally one upstream scalar, via a pluggable batched
//! kernel. The base contract here decides *whether and how* to recompute a
//! block; the numeric operation lives entirely in the kernel.
//!
//! # Pull algorithm
//!
//! `recalculate_block(block)`:
//!
//! 1. If the block's staleness flag is clear, return its cached presence.
//!    Any upstream write since the last pull would have cascaded staleness
//!    here at write time, so a clean flag proves the cache is current.
//!
//! 2. Recursively pull each upstream block node at the same block index.
//!
//! 3. If a scalar operand exists, pull it before any block borrow is
//!    taken, so a reduction scalar over one of this node's own inputs can
//!    pull freely. An absent scalar abandons the recompute.
//!
//! 4. Borrow every upstream block; if any is absent, abandon the
//!    recompute. Sparsity propagates by omission; this is an expected
//!    silent state, not an error.
//!
//! 5. Otherwise allocate/borrow the own output block, run the kernel, and
//!    clear the staleness flag.
//!
//! An abandoned recompute resolves the block to *clean absent*: the cached
//! output is released and the flag cleared, so the node never serves data
//! that outlived its inputs. Staleness returns with the next upstream
//! notification.
//!
//! # Kernels
//!
//! Kernels are plain `fn` pointers: pure, allocation-free, no captured
//! state. They read one or more fixed-length lane slices (plus at most one
//! scalar) and write exactly one lane slice of the same length: one
//! batched vector-width operation per call.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::error::GraphError;
use crate::store::{BlockLayout, Lane, Presence, SparseBlockStore};

use super::config::GraphConfig;
use super::node::{BlockSource, ScalarSource};
use super::observer::{Invalidation, ObserverFn, ObserverId, ObserverList};

/// Kernel over one input block.
pub type UnaryKernel<T> = fn(&[T], &mut [T]);
/// Kernel over one input block and a scalar.
pub type UnaryScalarKernel<T> = fn(&[T], T, &mut [T]);
/// Kernel over two input blocks.
pub type BinaryKernel<T> = fn(&[T], &[T], &mut [T]);
/// Kernel over two input blocks and a scalar.
pub type BinaryScalarKernel<T> = fn(&[T], &[T], T, &mut [T]);
/// Kernel over three input blocks.
pub type TernaryKernel<T> = fn(&[T], &[T], &[T], &mut [T]);
/// Kernel over three input blocks and a scalar.
pub type TernaryScalarKernel<T> = fn(&[T], &[T], &[T], T, &mut [T]);

/// Storage, staleness bookkeeping, and observer plumbing shared by every
/// derived node arity.
struct DerivedCore<T: Lane> {
    store: RefCell<SparseBlockStore<T>>,
    observers: RefCell<ObserverList>,
    recomputes: Cell<u64>,
}

impl<T: Lane> DerivedCore<T> {
    fn new(config: &GraphConfig<T>) -> Self {
        Self {
            store: RefCell::new(config.build_store()),
            observers: RefCell::new(ObserverList::new()),
            recomputes: Cell::new(0),
        }
    }

    fn layout(&self) -> BlockLayout {
        self.store.borrow().layout()
    }

    /// Cached presence when the block is clean, `None` when it must be
    /// recomputed.
    fn fresh_presence(&self, block: usize) -> Option<Presence> {
        let store = self.store.borrow();
        if store.is_stale(block) {
            None
        } else {
            Some(store.presence(block))
        }
    }

    /// Mark staleness and cascade the notification, but only when
    /// something became newly stale; repeated invalidations of an
    /// already-stale block stop here.
    fn invalidate(&self, invalidation: Invalidation) {
        let newly = {
            let mut store = self.store.borrow_mut();
            match invalidation {
                Invalidation::Block(block) => store.mark_stale(block),
                Invalidation::All => store.mark_all_stale(),
            }
        };
        if newly {
            self.observers.borrow().notify(invalidation);
        }
    }

    /// Record an abandoned recompute: the block becomes clean absent.
    fn resolve_absent(&self, block: usize) -> Presence {
        trace!(block, "operand absent, output resolved to absent");
        let mut store = self.store.borrow_mut();
        store.release_block(block);
        store.clear_stale(block);
        Presence::Absent
    }

    /// Write the output block via `write` and mark it clean.
    fn commit(&self, block: usize, write: impl FnOnce(&mut [T])) -> Presence {
        {
            let mut store = self.store.borrow_mut();
            write(store.ensure_block(block));
            store.clear_stale(block);
        }
        self.recomputes.set(self.recomputes.get() + 1);
        Presence::Present
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

/// Routes upstream invalidations into a node's core.
trait Invalidate {
    fn invalidate(&self, invalidation: Invalidation);
}

/// Subscribe `node` to an upstream block node's staleness notifications.
/// The callback holds only a weak reference; a dropped node is a no-op.
fn forward_block<T: Lane, N: Invalidate + 'static>(
    upstream: &Rc<dyn BlockSource<T>>,
    node: &Rc<N>,
) {
    let weak = Rc::downgrade(node);
    upstream.observe(Box::new(move |invalidation| {
        if let Some(node) = weak.upgrade() {
            node.invalidate(invalidation);
        }
    }));
}

/// Subscribe `node` to an upstream scalar's staleness notifications. A
/// scalar change invalidates *all* of the node's blocks, unlike an
/// upstream-block change which invalidates only the matching index.
fn forward_scalar<T: Lane, N: Invalidate + 'static>(
    scalar: &Rc<dyn ScalarSource<T>>,
    node: &Rc<N>,
) {
    let weak = Rc::downgrade(node);
    scalar.observe(Box::new(move |_| {
        if let Some(node) = weak.upgrade() {
            node.invalidate(Invalidation::All);
        }
    }));
}

enum UnaryOp<T: Lane> {
    Map(UnaryKernel<T>),
    MapScalar(Rc<dyn ScalarSource<T>>, UnaryScalarKernel<T>),
}

/// A derived node over one upstream block node, optionally augmented with
/// a scalar operand.
pub struct UnaryNode<T: Lane> {
    input: Rc<dyn BlockSource<T>>,
    op: UnaryOp<T>,
    core: DerivedCore<T>,
}

impl<T: Lane> UnaryNode<T> {
    /// `out = kernel(input)`.
    pub fn new(
        input: Rc<dyn BlockSource<T>>,
        config: GraphConfig<T>,
        kernel: UnaryKernel<T>,
    ) -> Result<Rc<Self>, GraphError> {
        Self::build(input, config, UnaryOp::Map(kernel))
    }

    /// `out = kernel(input, scalar)`.
    pub fn with_scalar(
        input: Rc<dyn BlockSource<T>>,
        scalar: Rc<dyn ScalarSource<T>>,
        config: GraphConfig<T>,
        kernel: UnaryScalarKernel<T>,
    ) -> Result<Rc<Self>, GraphError> {
        Self::build(input, config, UnaryOp::MapScalar(scalar, kernel))
    }

    fn build(
        input: Rc<dyn BlockSource<T>>,
        config: GraphConfig<T>,
        op: UnaryOp<T>,
    ) -> Result<Rc<Self>, GraphError> {
        config.check_upstream(input.layout())?;
        let node = Rc::new(Self {
            input: Rc::clone(&input),
            op,
            core: DerivedCore::new(&config),
        });
        forward_block(&input, &node);
        if let UnaryOp::MapScalar(scalar, _) = &node.op {
            forward_scalar(scalar, &node);
        }
        Ok(node)
    }

    /// Number of successful block recomputations. Diagnostic for tests and
    /// instrumentation.
    pub fn recompute_count(&self) -> u64 {
        self.core.recomputes.get()
    }
}

impl<T: Lane> Invalidate for UnaryNode<T> {
    fn invalidate(&self, invalidation: Invalidation) {
        self.core.invalidate(invalidation);
    }
}

impl<T: Lane> BlockSource<T> for UnaryNode<T> {
    fn layout(&self) -> BlockLayout {
        self.core.layout()
    }

    fn recalculate_block(&self, block: usize) -> Presence {
        if let Some(presence) = self.core.fresh_presence(block) {
            return presence;
        }
        self.input.recalculate_block(block);

        match &self.op {
            UnaryOp::Map(kernel) => {
                let Some(input) = self.input.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let kernel = *kernel;
                self.core.commit(block, |out| {
                    debug_assert_eq!(input.len(), out.len());
                    kernel(&input, out);
                })
            }
            UnaryOp::MapScalar(scalar, kernel) => {
                let Some(value) = scalar.recalculate() else {
                    return self.core.resolve_absent(block);
                };
                let Some(input) = self.input.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let kernel = *kernel;
                self.core.commit(block, |out| {
                    debug_assert_eq!(input.len(), out.len());
                    kernel(&input, value, out);
                })
            }
        }
    }

    fn try_get_block(&self, block: usize) -> Option<Ref<'_, [T]>> {
        self.core.try_get_block(block)
    }

    fn observe(&self, notify: ObserverFn) -> ObserverId {
        self.core.observe(notify)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.core.unobserve(id)
    }
}

enum BinaryOp<T: Lane> {
    Zip(BinaryKernel<T>),
    ZipScalar(Rc<dyn ScalarSource<T>>, BinaryScalarKernel<T>),
}

/// A derived node over two upstream block nodes, optionally augmented with
/// a scalar operand.
pub struct BinaryNode<T: Lane> {
    lhs: Rc<dyn BlockSource<T>>,
    rhs: Rc<dyn BlockSource<T>>,
    op: BinaryOp<T>,
    core: DerivedCore<T>,
}

impl<T: Lane> BinaryNode<T> {
    /// `out = kernel(lhs, rhs)`.
    pub fn new(
        lhs: Rc<dyn BlockSource<T>>,
        rhs: Rc<dyn BlockSource<T>>,
        config: GraphConfig<T>,
        kernel: BinaryKernel<T>,
    ) -> Result<Rc<Self>, GraphError> {
        Self::build(lhs, rhs, config, BinaryOp::Zip(kernel))
    }

    /// `out = kernel(lhs, rhs, scalar)`. Which side of the operation the
    /// scalar occupies is the kernel's business.
    pub fn with_scalar(
        lhs: Rc<dyn BlockSource<T>>,
        rhs: Rc<dyn BlockSource<T>>,
        scalar: Rc<dyn ScalarSource<T>>,
        config: GraphConfig<T>,
        kernel: BinaryScalarKernel<T>,
    ) -> Result<Rc<Self>, GraphError> {
        Self::build(lhs, rhs, config, BinaryOp::ZipScalar(scalar, kernel))
    }

    fn build(
        lhs: Rc<dyn BlockSource<T>>,
        rhs: Rc<dyn BlockSource<T>>,
        config: GraphConfig<T>,
        op: BinaryOp<T>,
    ) -> Result<Rc<Self>, GraphError> {
        config.check_upstream(lhs.layout())?;
        config.check_upstream(rhs.layout())?;
        let node = Rc::new(Self {
            lhs: Rc::clone(&lhs),
            rhs: Rc::clone(&rhs),
            op,
            core: DerivedCore::new(&config),
        });
        forward_block(&lhs, &node);
        forward_block(&rhs, &node);
        if let BinaryOp::ZipScalar(scalar, _) = &node.op {
            forward_scalar(scalar, &node);
        }
        Ok(node)
    }

    /// Number of successful block recomputations.
    pub fn recompute_count(&self) -> u64 {
        self.core.recomputes.get()
    }
}

impl<T: Lane> Invalidate for BinaryNode<T> {
    fn invalidate(&self, invalidation: Invalidation) {
        self.core.invalidate(invalidation);
    }
}

impl<T: Lane> BlockSource<T> for BinaryNode<T> {
    fn layout(&self) -> BlockLayout {
        self.core.layout()
    }

    fn recalculate_block(&self, block: usize) -> Presence {
        if let Some(presence) = self.core.fresh_presence(block) {
            return presence;
        }
        self.lhs.recalculate_block(block);
        self.rhs.recalculate_block(block);

        match &self.op {
            BinaryOp::Zip(kernel) => {
                let Some(a) = self.lhs.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let Some(b) = self.rhs.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let kernel = *kernel;
                self.core.commit(block, |out| {
                    debug_assert_eq!(a.len(), out.len());
                    kernel(&a, &b, out);
                })
            }
            BinaryOp::ZipScalar(scalar, kernel) => {
                let Some(value) = scalar.recalculate() else {
                    return self.core.resolve_absent(block);
                };
                let Some(a) = self.lhs.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let Some(b) = self.rhs.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let kernel = *kernel;
                self.core.commit(block, |out| {
                    debug_assert_eq!(a.len(), out.len());
                    kernel(&a, &b, value, out);
                })
            }
        }
    }

    fn try_get_block(&self, block: usize) -> Option<Ref<'_, [T]>> {
        self.core.try_get_block(block)
    }

    fn observe(&self, notify: ObserverFn) -> ObserverId {
        self.core.observe(notify)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.core.unobserve(id)
    }
}

enum TernaryOp<T: Lane> {
    Zip(TernaryKernel<T>),
    ZipScalar(Rc<dyn ScalarSource<T>>, TernaryScalarKernel<T>),
}

/// A derived node over three upstream block nodes, optionally augmented
/// with a scalar operand.
pub struct TernaryNode<T: Lane> {
    a: Rc<dyn BlockSource<T>>,
    b: Rc<dyn BlockSource<T>>,
    c: Rc<dyn BlockSource<T>>,
    op: TernaryOp<T>,
    core: DerivedCore<T>,
}

impl<T: Lane> TernaryNode<T> {
    /// `out = kernel(a, b, c)`.
    pub fn new(
        a: Rc<dyn BlockSource<T>>,
        b: Rc<dyn BlockSource<T>>,
        c: Rc<dyn BlockSource<T>>,
        config: GraphConfig<T>,
        kernel: TernaryKernel<T>,
    ) -> Result<Rc<Self>, GraphError> {
        Self::build(a, b, c, config, TernaryOp::Zip(kernel))
    }

    /// `out = kernel(a, b, c, scalar)`.
    pub fn with_scalar(
        a: Rc<dyn BlockSource<T>>,
        b: Rc<dyn BlockSource<T>>,
        c: Rc<dyn BlockSource<T>>,
        scalar: Rc<dyn ScalarSource<T>>,
        config: GraphConfig<T>,
        kernel: TernaryScalarKernel<T>,
    ) -> Result<Rc<Self>, GraphError> {
        Self::build(a, b, c, config, TernaryOp::ZipScalar(scalar, kernel))
    }

    fn build(
        a: Rc<dyn BlockSource<T>>,
        b: Rc<dyn BlockSource<T>>,
        c: Rc<dyn BlockSource<T>>,
        config: GraphConfig<T>,
        op: TernaryOp<T>,
    ) -> Result<Rc<Self>, GraphError> {
        config.check_upstream(a.layout())?;
        config.check_upstream(b.layout())?;
        config.check_upstream(c.layout())?;
        let node = Rc::new(Self {
            a: Rc::clone(&a),
            b: Rc::clone(&b),
            c: Rc::clone(&c),
            op,
            core: DerivedCore::new(&config),
        });
        forward_block(&a, &node);
        forward_block(&b, &node);
        forward_block(&c, &node);
        if let TernaryOp::ZipScalar(scalar, _) = &node.op {
            forward_scalar(scalar, &node);
        }
        Ok(node)
    }

    /// Number of successful block recomputations.
    pub fn recompute_count(&self) -> u64 {
        self.core.recomputes.get()
    }
}

impl<T: Lane> Invalidate for TernaryNode<T> {
    fn invalidate(&self, invalidation: Invalidation) {
        self.core.invalidate(invalidation);
    }
}

impl<T: Lane> BlockSource<T> for TernaryNode<T> {
    fn layout(&self) -> BlockLayout {
        self.core.layout()
    }

    fn recalculate_block(&self, block: usize) -> Presence {
        if let Some(presence) = self.core.fresh_presence(block) {
            return presence;
        }
        self.a.recalculate_block(block);
        self.b.recalculate_block(block);
        self.c.recalculate_block(block);

        match &self.op {
            TernaryOp::Zip(kernel) => {
                let Some(a) = self.a.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let Some(b) = self.b.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let Some(c) = self.c.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let kernel = *kernel;
                self.core.commit(block, |out| {
                    debug_assert_eq!(a.len(), out.len());
                    kernel(&a, &b, &c, out);
                })
            }
            TernaryOp::ZipScalar(scalar, kernel) => {
                let Some(value) = scalar.recalculate() else {
                    return self.core.resolve_absent(block);
                };
                let Some(a) = self.a.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let Some(b) = self.b.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let Some(c) = self.c.try_get_block(block) else {
                    return self.core.resolve_absent(block);
                };
                let kernel = *kernel;
                self.core.commit(block, |out| {
                    debug_assert_eq!(a.len(), out.len());
                    kernel(&a, &b, &c, value, out);
                })
            }
        }
    }

    fn try_get_block(&self, block: usize) -> Option<Ref<'_, [T]>> {
        self.core.try_get_block(block)
    }

    fn observe(&self, notify: ObserverFn) -> ObserverId {
        self.core.observe(notify)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.core.unobserve(id)
    }
}
