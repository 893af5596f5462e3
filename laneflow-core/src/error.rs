//! Error types for graph construction.
//!
//! The running graph has no user-visible failure surface: missing data is a
//! legitimate silent state communicated by absence, and kernel contract
//! violations are defects caught by assertions and tests. What remains are
//! configuration errors, which must fail fast at construction time.

use thiserror::Error;

/// A construction-time configuration error.
///
/// Nodes wired across a dependency edge must share one block geometry;
/// mixing block sizes or capacities is rejected when the downstream node is
/// built, before any storage is touched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// An upstream node uses a different block size than this node's
    /// configuration.
    #[error("block size mismatch: node configured for {expected} lanes per block, upstream uses {found}")]
    BlockSizeMismatch { expected: usize, found: usize },

    /// An upstream node addresses a different entity capacity than this
    /// node's configuration.
    #[error("capacity mismatch: node configured for {expected} entities, upstream addresses {found}")]
    CapacityMismatch { expected: usize, found: usize },
}
