//! Laneflow Core
//!
//! A lazy, pull-based dataflow graph computing per-entity numeric values
//! in fixed-size batches aligned to SIMD width, over sparse block-addressed
//! storage. Built for simulations where thousands of entities update every
//! tick: numeric transforms compose into a graph that recomputes only what
//! a pull actually needs, and never materializes storage for entities that
//! never populate a stream.
//!
//! # Architecture
//!
//! - `store`: block/lane addressing and the sparse block store
//! - `graph`: leaves, derived nodes, scalar nodes, staleness observers
//! - `ops`: the operator catalogue (pure kernels over the node contracts)
//!
//! # The contract under sparsity
//!
//! Absence ("no data for any entity in this range") is a first-class
//! state, distinct from every numeric value. It propagates downstream by
//! omission: a derived block whose operand is absent is itself absent, and
//! that is an expected silent outcome, not an error. Staleness propagates
//! eagerly but cheaply (flags and observer callbacks, no recomputation),
//! and pulls settle it lazily, bottom-up.
//!
//! # Example
//!
//! ```rust,ignore
//! use laneflow_core::{BlockLeaf, GraphConfig, ScalarLeaf, ops};
//!
//! let config = GraphConfig::new(10_000, 0.0_f32);
//! let speed = BlockLeaf::new(config);
//! let scale = ScalarLeaf::with_value(1.5);
//! let scaled = ops::arithmetic::mul_scalar(speed.clone(), scale, config)?;
//!
//! speed.set(42, 2.0);
//! scaled.recalculate_block(2);          // pull the block holding entity 42
//! assert_eq!(scaled.read_lane(42), Some(3.0));
//! ```
//!
//! The graph is single-threaded and synchronous: one logical writer and
//! reader per tick, no locks, no suspension points. When to pull is the
//! caller's business.

pub mod error;
pub mod graph;
pub mod ops;
pub mod store;

pub use error::GraphError;
pub use graph::{
    BinaryNode, BlockLeaf, BlockSource, GraphConfig, Invalidation, LaneHandle, ObserverId,
    ReduceNode, ScalarLeaf, ScalarSource, TernaryNode, UnaryNode,
};
pub use store::{Allocation, BlockAddr, BlockLayout, Lane, Presence, DEFAULT_BLOCK_SIZE};
