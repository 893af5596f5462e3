//! Block/Lane Addressing
//!
//! Entity indices are dense integers handed out by an external registry.
//! Storage and recomputation happen per *block*: a fixed-length group of
//! lanes sized to the host SIMD width. Every node in a connected subgraph
//! shares one block size, so the same entity index resolves to the same
//! (block, lane) coordinate everywhere along a dependency edge.

/// Default block size: the host SIMD width in `f32` lanes (512 bits).
///
/// Callers may pick a different width per subgraph via
/// [`BlockLayout::new`], but every node along a dependency edge must agree.
pub const DEFAULT_BLOCK_SIZE: usize = 16;

/// The (block, lane) coordinate of one entity within a block store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAddr {
    /// Index of the lane block.
    pub block: usize,
    /// Lane slot within that block.
    pub lane: usize,
}

/// Block geometry shared by every node in a connected subgraph.
///
/// A layout fixes the lane count per block and the entity capacity; from
/// those it derives the block count (`ceil(capacity / block_size)`). Two
/// nodes may be wired together only if their layouts are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    block_size: usize,
    capacity: usize,
}

impl BlockLayout {
    /// Create a layout for `capacity` entities in blocks of `block_size` lanes.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` or `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be non-zero");
        assert!(capacity > 0, "capacity must be non-zero");
        Self {
            block_size,
            capacity,
        }
    }

    /// Lanes per block.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Maximum number of entities this layout addresses.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks needed to cover the capacity.
    ///
    /// The tail block is full-length even when the capacity is not a
    /// multiple of the block size; its surplus lanes hold the fill value.
    #[inline]
    #[must_use]
    pub const fn block_count(&self) -> usize {
        self.capacity.div_ceil(self.block_size)
    }

    /// Resolve an entity index to its (block, lane) coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is outside the layout's capacity. Out-of-range
    /// indices are a programmer error, not a recoverable condition.
    #[inline]
    #[must_use]
    pub fn locate(&self, entity: usize) -> BlockAddr {
        assert!(
            entity < self.capacity,
            "entity index {entity} out of range for capacity {}",
            self.capacity
        );
        BlockAddr {
            block: entity / self.block_size,
            lane: entity % self.block_size,
        }
    }
}
