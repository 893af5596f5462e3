//! Dataflow Graph Nodes
//!
//! This module implements the node layer over the block store: mutable
//! leaves, derived block nodes, scalar nodes, and the staleness observer
//! wiring between them.
//!
//! # Concepts
//!
//! ## Leaves
//!
//! A [`BlockLeaf`] holds externally written per-entity values; a
//! [`ScalarLeaf`] holds one externally written value. Writes that change
//! nothing are absorbed; writes that change data notify observers without
//! recomputing anything.
//!
//! ## Derived nodes
//!
//! [`UnaryNode`], [`BinaryNode`], and [`TernaryNode`] cache one output
//! block per block index and recompute a block only when it is pulled
//! while stale. [`ReduceNode`] folds a block node into one scalar the same
//! way.
//!
//! ## Staleness propagation
//!
//! A write marks the affected block stale and notifies each registered
//! observer; derived nodes forward the notification when something of
//! theirs becomes newly stale. Nothing recomputes until a pull arrives;
//! the cascade is flags and callbacks only.

mod config;
mod derived;
mod leaf;
mod node;
mod observer;
mod scalar;

pub use config::GraphConfig;
pub use derived::{
    BinaryKernel, BinaryNode, BinaryScalarKernel, TernaryKernel, TernaryNode,
    TernaryScalarKernel, UnaryKernel, UnaryNode, UnaryScalarKernel,
};
pub use leaf::{BlockLeaf, LaneHandle};
pub use node::{BlockSource, ScalarSource};
pub use observer::{Invalidation, ObserverFn, ObserverId, ObserverList};
pub use scalar::{Aggregator, BlockReducer, ReduceNode, ScalarLeaf};
