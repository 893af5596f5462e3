//! Block-Addressed Storage
//!
//! This module implements the storage substrate the dataflow graph computes
//! over: block/lane addressing and the sparse block store.
//!
//! # Overview
//!
//! Per-entity values live in fixed-length lane blocks sized to the host
//! SIMD width. A node's store holds one optional block per block index plus
//! a staleness flag; absence ("no data for any entity in this range") is a
//! first-class state distinct from any numeric value, including zero.

mod address;
mod sparse;

pub use address::{BlockAddr, BlockLayout, DEFAULT_BLOCK_SIZE};
pub use sparse::{Allocation, SparseBlockStore};

use std::fmt::Debug;

/// Marker for types that can occupy a lane.
///
/// Lanes are plain copyable values compared by equality for the identity
/// short-circuit on writes. Implemented for every `Copy + PartialEq` type;
/// the operator catalogue instantiates the graph for `f32`.
pub trait Lane: Copy + PartialEq + Debug + 'static {}

impl<T: Copy + PartialEq + Debug + 'static> Lane for T {}

/// Whether a block (or scalar) holds data.
///
/// Absence is the legitimate "not yet computed" state that sparsity
/// propagates by omission. It is never encoded as a numeric sentinel:
/// kernels may legitimately produce any value, including NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The block is allocated and holds lane data.
    Present,
    /// No entity in the block's range has populated this node.
    Absent,
}

impl Presence {
    /// `true` for [`Presence::Present`].
    #[inline]
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Presence::Present)
    }

    /// `true` for [`Presence::Absent`].
    #[inline]
    #[must_use]
    pub const fn is_absent(self) -> bool {
        matches!(self, Presence::Absent)
    }
}
