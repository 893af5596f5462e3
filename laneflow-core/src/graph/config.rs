//! Shared Node Configuration
//!
//! Every node in a connected subgraph is built from the same configuration:
//! entity capacity, block size, fill value, and allocation mode. Derived
//! nodes verify at construction that their configuration matches every
//! upstream layout; mixing block geometries across a dependency edge is a
//! configuration error, caught before any storage is touched.

use crate::error::GraphError;
use crate::store::{Allocation, BlockLayout, Lane, SparseBlockStore, DEFAULT_BLOCK_SIZE};

/// Construction parameters shared across a subgraph.
///
/// # Example
///
/// ```rust,ignore
/// let config = GraphConfig::new(10_000, 0.0_f32).dense();
/// let positions = BlockLeaf::new(config);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphConfig<T: Lane> {
    capacity: usize,
    block_size: usize,
    fill: T,
    allocation: Allocation,
}

impl<T: Lane> GraphConfig<T> {
    /// Configuration for `capacity` entities with the given fill value,
    /// defaulting to [`DEFAULT_BLOCK_SIZE`] lanes per block and sparse
    /// allocation.
    #[must_use]
    pub fn new(capacity: usize, fill: T) -> Self {
        Self {
            capacity,
            block_size: DEFAULT_BLOCK_SIZE,
            fill,
            allocation: Allocation::Sparse,
        }
    }

    /// Override the block size.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be non-zero");
        self.block_size = block_size;
        self
    }

    /// Pre-allocate every block at construction.
    #[must_use]
    pub fn dense(mut self) -> Self {
        self.allocation = Allocation::Dense;
        self
    }

    /// Allocate blocks lazily on first write or recompute (the default).
    #[must_use]
    pub fn sparse(mut self) -> Self {
        self.allocation = Allocation::Sparse;
        self
    }

    /// The block geometry this configuration describes.
    #[must_use]
    pub fn layout(&self) -> BlockLayout {
        BlockLayout::new(self.capacity, self.block_size)
    }

    /// The value unwritten lanes of a present block hold.
    #[inline]
    pub fn fill(&self) -> T {
        self.fill
    }

    /// The allocation mode.
    #[inline]
    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    /// Build this node's backing store.
    pub(crate) fn build_store(&self) -> SparseBlockStore<T> {
        SparseBlockStore::new(self.layout(), self.fill, self.allocation)
    }

    /// Reject an upstream whose geometry differs from this configuration.
    pub(crate) fn check_upstream(&self, upstream: BlockLayout) -> Result<(), GraphError> {
        let own = self.layout();
        if own.block_size() != upstream.block_size() {
            return Err(GraphError::BlockSizeMismatch {
                expected: own.block_size(),
                found: upstream.block_size(),
            });
        }
        if own.capacity() != upstream.capacity() {
            return Err(GraphError::CapacityMismatch {
                expected: own.capacity(),
                found: upstream.capacity(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_simd_width_and_sparse() {
        let config = GraphConfig::new(100, 0.0_f32);
        assert_eq!(config.layout().block_size(), DEFAULT_BLOCK_SIZE);
        assert_eq!(config.allocation(), Allocation::Sparse);
    }

    #[test]
    fn check_upstream_rejects_mismatched_geometry() {
        let config = GraphConfig::new(64, 0.0_f32).with_block_size(16);
        let narrow = BlockLayout::new(64, 8);
        let short = BlockLayout::new(32, 16);

        assert_eq!(
            config.check_upstream(narrow),
            Err(GraphError::BlockSizeMismatch {
                expected: 16,
                found: 8
            })
        );
        assert_eq!(
            config.check_upstream(short),
            Err(GraphError::CapacityMismatch {
                expected: 64,
                found: 32
            })
        );
        assert!(config.check_upstream(config.layout()).is_ok());
    }
}
