//! Sparse Block Store
//!
//! Per-node storage: an array of optional fixed-length lane blocks plus one
//! staleness flag per block.
//!
//! # Presence vs. staleness
//!
//! These are independent axes:
//!
//! 1. A block is *absent* when no entity in its range has ever populated
//!    this node. Absent never means "all zero"; it means "no data yet".
//!
//! 2. A block is *stale* when its cached contents may no longer reflect the
//!    node's inputs. A derived node's cached block is valid iff its
//!    staleness flag is clear.
//!
//! Unwritten lanes of a present block hold the configured fill value, not a
//! numeric default.
//!
//! # Allocation modes
//!
//! Dense pre-allocates every block at construction (write-heavy leaves that
//! will populate most of the entity range). Sparse allocates a block on the
//! first successful write or recompute touching its range.

use tracing::{debug, trace};

use super::address::{BlockAddr, BlockLayout};
use super::{Lane, Presence};

/// Block allocation strategy for a node's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Pre-allocate every block at construction.
    Dense,
    /// Allocate a block on first write or recompute.
    Sparse,
}

/// Block-addressed storage for one node.
///
/// Owns `block_count` optional lane blocks and their staleness flags. All
/// blocks start stale: a derived node has computed nothing yet, and a leaf
/// simply never consults its own flags.
#[derive(Debug)]
pub struct SparseBlockStore<T: Lane> {
    layout: BlockLayout,
    fill: T,
    blocks: Vec<Option<Box<[T]>>>,
    stale: Vec<bool>,
}

impl<T: Lane> SparseBlockStore<T> {
    /// Create a store for the given layout.
    pub fn new(layout: BlockLayout, fill: T, allocation: Allocation) -> Self {
        let count = layout.block_count();
        let blocks = match allocation {
            Allocation::Dense => {
                debug!(blocks = count, "pre-allocating dense store");
                (0..count)
                    .map(|_| Some(vec![fill; layout.block_size()].into_boxed_slice()))
                    .collect()
            }
            Allocation::Sparse => (0..count).map(|_| None).collect(),
        };
        Self {
            layout,
            fill,
            blocks,
            stale: vec![true; count],
        }
    }

    /// The store's block geometry.
    #[inline]
    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// The value unwritten lanes of a present block hold.
    #[inline]
    pub fn fill(&self) -> T {
        self.fill
    }

    /// Resolve an entity index to its (block, lane) coordinate.
    #[inline]
    pub fn locate(&self, entity: usize) -> BlockAddr {
        self.layout.locate(entity)
    }

    /// Whether the block at `block` is present or absent.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range block index.
    #[inline]
    pub fn presence(&self, block: usize) -> Presence {
        if self.blocks[block].is_some() {
            Presence::Present
        } else {
            Presence::Absent
        }
    }

    /// Borrow the lanes of a present block. `None` means absent.
    #[inline]
    pub fn block(&self, block: usize) -> Option<&[T]> {
        self.blocks[block].as_deref()
    }

    /// Mutably borrow the lanes of a present block. `None` means absent.
    #[inline]
    pub fn block_mut(&mut self, block: usize) -> Option<&mut [T]> {
        self.blocks[block].as_deref_mut()
    }

    /// Borrow a block's lanes, allocating it (filled with the fill value)
    /// if it was absent.
    pub fn ensure_block(&mut self, block: usize) -> &mut [T] {
        let size = self.layout.block_size();
        let fill = self.fill;
        let slot = &mut self.blocks[block];
        if slot.is_none() {
            trace!(block, "allocating lane block");
        }
        slot.get_or_insert_with(|| vec![fill; size].into_boxed_slice())
    }

    /// Return a block to the absent state, discarding its lanes.
    pub fn release_block(&mut self, block: usize) {
        self.blocks[block] = None;
    }

    /// Write one lane, allocating its block if needed.
    ///
    /// Returns `true` if the store changed: the block was allocated or the
    /// lane's value differs from what it held. A changed block is marked
    /// stale. Rewriting a present lane with its current value changes
    /// nothing and must not mark the block stale, which would cascade a
    /// needless recompute through every downstream node.
    pub fn write_lane(&mut self, entity: usize, value: T) -> bool {
        self.write_at(self.layout.locate(entity), value)
    }

    /// [`SparseBlockStore::write_lane`] with a pre-resolved coordinate, for
    /// hot paths that cache the address translation.
    pub fn write_at(&mut self, addr: BlockAddr, value: T) -> bool {
        let allocating = self.blocks[addr.block].is_none();
        let lanes = self.ensure_block(addr.block);
        if !allocating && lanes[addr.lane] == value {
            return false;
        }
        lanes[addr.lane] = value;
        self.stale[addr.block] = true;
        true
    }

    /// Read one lane. `None` means the lane's block is absent; a present
    /// but unwritten lane reads as the fill value.
    pub fn read_lane(&self, entity: usize) -> Option<T> {
        self.read_at(self.layout.locate(entity))
    }

    /// [`SparseBlockStore::read_lane`] with a pre-resolved coordinate.
    pub fn read_at(&self, addr: BlockAddr) -> Option<T> {
        self.blocks[addr.block].as_ref().map(|lanes| lanes[addr.lane])
    }

    /// Whether the block's cached contents may be out of date.
    #[inline]
    pub fn is_stale(&self, block: usize) -> bool {
        self.stale[block]
    }

    /// Mark one block stale. Idempotent: returns `true` only when the block
    /// was clean, so callers can suppress repeat notifications.
    pub fn mark_stale(&mut self, block: usize) -> bool {
        let newly = !self.stale[block];
        self.stale[block] = true;
        newly
    }

    /// Mark every block stale. Returns `true` if any block was clean.
    pub fn mark_all_stale(&mut self) -> bool {
        let mut newly = false;
        for flag in &mut self.stale {
            newly |= !*flag;
            *flag = true;
        }
        newly
    }

    /// Clear one block's staleness flag.
    #[inline]
    pub fn clear_stale(&mut self, block: usize) {
        self.stale[block] = false;
    }

    /// Number of present blocks.
    pub fn present_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }
}
