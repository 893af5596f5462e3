//! Integration Tests for the Dataflow Graph
//!
//! These tests verify that leaves, derived nodes, scalars, and reductions
//! work together correctly under partial, sparse population.

use std::rc::Rc;

use laneflow_core::ops;
use laneflow_core::{
    Allocation, BlockLeaf, BlockSource, GraphConfig, GraphError, Presence, ScalarLeaf,
    ScalarSource,
};

fn config(capacity: usize) -> GraphConfig<f32> {
    GraphConfig::new(capacity, 0.0)
}

/// Reading a leaf immediately after a write returns the written value,
/// including on both sides of a block boundary.
#[test]
fn read_after_write_across_block_boundary() {
    let leaf = BlockLeaf::new(config(64));

    leaf.set(15, 1.5); // last lane of block 0
    leaf.set(16, 2.5); // first lane of block 1

    assert_eq!(leaf.get(15), Some(1.5));
    assert_eq!(leaf.get(16), Some(2.5));
}

/// A redundant write must not mark anything stale: the dependent node's
/// recompute counter does not move.
#[test]
fn redundant_write_never_cascades() {
    let leaf = BlockLeaf::new(config(64));
    leaf.set(3, 7.0);

    let doubled = ops::arithmetic::mul(
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        config(64),
    )
    .unwrap();

    doubled.recalculate_block(0);
    assert_eq!(doubled.recompute_count(), 1);

    leaf.set(3, 7.0);
    doubled.recalculate_block(0);
    assert_eq!(doubled.recompute_count(), 1);

    leaf.set(3, 8.0);
    doubled.recalculate_block(0);
    assert_eq!(doubled.recompute_count(), 2);
}

/// Sparsity propagates by omission: a binary node's block stays absent
/// while either operand's block is absent, and unrelated population does
/// not change that.
#[test]
fn absent_operand_block_keeps_output_absent() {
    let a = BlockLeaf::new(config(64));
    let b = BlockLeaf::new(config(64));
    a.set(4, 1.0); // block 0 of A; block 0 of B never populated

    let sum = ops::arithmetic::add(
        Rc::clone(&a) as Rc<dyn BlockSource<f32>>,
        b,
        config(64),
    )
    .unwrap();

    assert_eq!(sum.recalculate_block(0), Presence::Absent);

    // Populate an unrelated block of A and pull it.
    a.set(20, 2.0);
    sum.recalculate_block(1);

    assert_eq!(sum.recalculate_block(0), Presence::Absent);
    assert!(sum.try_get_block(0).is_none());
}

/// A binary add tracks per-lane updates while leaving unrelated lanes of
/// the same block untouched.
#[test]
fn binary_add_follows_lane_updates() {
    let a = BlockLeaf::new(config(64));
    let b = BlockLeaf::new(config(64));
    a.set(6, 3.0);
    b.set(6, 4.0);
    a.set(7, 1.0);
    b.set(7, 1.0);

    let sum = ops::arithmetic::add(
        Rc::clone(&a) as Rc<dyn BlockSource<f32>>,
        b,
        config(64),
    )
    .unwrap();

    sum.recalculate_block(0);
    assert_eq!(sum.read_lane(6), Some(7.0));

    a.set(6, 5.0);
    sum.recalculate_block(0);
    assert_eq!(sum.read_lane(6), Some(9.0));
    assert_eq!(sum.read_lane(7), Some(2.0));
}

/// Multiplying a fully populated block by a scalar scales every lane.
#[test]
fn multiply_by_scalar_scales_all_lanes() {
    let leaf = BlockLeaf::new(config(64));
    for lane in 0..16 {
        leaf.set(lane, 2.0);
    }
    let factor = ScalarLeaf::with_value(3.0);

    let scaled = ops::arithmetic::mul_scalar(leaf, factor, config(64)).unwrap();
    scaled.recalculate_block(0);

    for lane in 0..16 {
        assert_eq!(scaled.read_lane(lane), Some(6.0));
    }
}

/// A mean reduction over exactly one present block equals that block's
/// own mean, and reduces to absence when nothing is present.
#[test]
fn mean_reduction_presence() {
    let leaf = BlockLeaf::new(config(64));
    let average = ops::reduce::mean(Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>);

    assert_eq!(average.recalculate(), None);

    for lane in 0..16 {
        leaf.set(lane, (lane as f32 + 1.0) * 10.0); // 10, 20, ..., 160
    }
    assert_eq!(average.recalculate(), Some(85.0));
}

/// The 32-entity scenario: two blocks of 16, a handful of writes, and an
/// add-scalar node over the leaf. Populated lanes carry value + 5, the
/// other lanes of present blocks carry fill + 5, and nothing else exists.
#[test]
fn add_scalar_over_sparse_population() {
    let leaf = BlockLeaf::new(config(32));
    leaf.set(0, 10.0);
    leaf.set(1, 20.0);
    leaf.set(17, 99.0);

    let bias = ScalarLeaf::with_value(5.0);
    let biased = ops::arithmetic::add_scalar(leaf, bias, config(32)).unwrap();

    assert_eq!(biased.recalculate_block(0), Presence::Present);
    assert_eq!(biased.recalculate_block(1), Presence::Present);

    assert_eq!(biased.read_lane(0), Some(15.0));
    assert_eq!(biased.read_lane(1), Some(25.0));
    assert_eq!(biased.read_lane(17), Some(104.0));

    // Unwritten lanes of present blocks: fill value through the kernel.
    for lane in 2..16 {
        assert_eq!(biased.read_lane(lane), Some(5.0));
    }
    assert_eq!(biased.read_lane(16), Some(5.0));
    for lane in 18..32 {
        assert_eq!(biased.read_lane(lane), Some(5.0));
    }
}

/// A scalar change invalidates every block of its consumer; a block write
/// invalidates only the matching block.
#[test]
fn scalar_invalidation_is_broad_and_block_invalidation_narrow() {
    let leaf = BlockLeaf::new(config(64));
    leaf.set(0, 1.0);
    leaf.set(17, 2.0);
    leaf.set(33, 3.0);
    let bias = ScalarLeaf::with_value(1.0_f32);

    let biased = ops::arithmetic::add_scalar(
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        Rc::clone(&bias) as Rc<dyn ScalarSource<f32>>,
        config(64),
    )
    .unwrap();

    let pull_all = |node: &Rc<laneflow_core::UnaryNode<f32>>| {
        for block in 0..4 {
            node.recalculate_block(block);
        }
    };

    pull_all(&biased);
    assert_eq!(biased.recompute_count(), 3); // three present blocks

    leaf.set(17, 4.0);
    pull_all(&biased);
    assert_eq!(biased.recompute_count(), 4); // only block 1 recomputed

    bias.set(2.0);
    pull_all(&biased);
    assert_eq!(biased.recompute_count(), 7); // every present block again
}

/// Staleness flows through a chain of derived nodes on write, but no
/// recomputation happens anywhere until the pull.
#[test]
fn chained_nodes_recompute_only_on_pull() {
    let leaf = BlockLeaf::new(config(64));
    leaf.set(2, 2.0);

    let squared = ops::arithmetic::mul(
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        config(64),
    )
    .unwrap();
    let shifted = ops::arithmetic::sub(
        Rc::clone(&squared) as Rc<dyn BlockSource<f32>>,
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        config(64),
    )
    .unwrap();

    shifted.recalculate_block(0);
    assert_eq!(shifted.read_lane(2), Some(2.0)); // 4 - 2

    leaf.set(2, 3.0);
    assert_eq!(squared.recompute_count(), 1);
    assert_eq!(shifted.recompute_count(), 1);

    shifted.recalculate_block(0);
    assert_eq!(shifted.read_lane(2), Some(6.0)); // 9 - 3
    assert_eq!(squared.recompute_count(), 2);
    assert_eq!(shifted.recompute_count(), 2);
}

/// A reduction can feed back as the scalar operand of a derived node:
/// normalizing a stream by its own mean.
#[test]
fn normalize_by_own_mean() {
    let leaf = BlockLeaf::new(config(64));
    for lane in 0..16 {
        leaf.set(lane, 2.0);
    }

    let average = ops::reduce::mean(Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>);
    let normalized = ops::arithmetic::div_scalar(
        Rc::clone(&leaf) as Rc<dyn BlockSource<f32>>,
        average,
        config(64),
    )
    .unwrap();

    normalized.recalculate_block(0);
    assert_eq!(normalized.read_lane(0), Some(1.0));
    assert_eq!(normalized.read_lane(15), Some(1.0));
}

/// Mixing block geometries across a dependency edge fails at construction.
#[test]
fn mismatched_geometry_fails_fast() {
    let narrow = BlockLeaf::new(GraphConfig::new(64, 0.0).with_block_size(8));
    let result = ops::arithmetic::neg(narrow, config(64));
    assert_eq!(
        result.err(),
        Some(GraphError::BlockSizeMismatch {
            expected: 16,
            found: 8
        })
    );
}

/// Dense allocation makes every block present from the start; sparse
/// presents none until written.
#[test]
fn allocation_modes_differ_at_construction() {
    let dense = BlockLeaf::new(GraphConfig::new(64, 1.0).dense());
    let sparse = BlockLeaf::new(GraphConfig::new(64, 1.0));

    assert_eq!(dense.recalculate_block(0), Presence::Present);
    assert_eq!(dense.get(5), Some(1.0));
    assert_eq!(sparse.recalculate_block(0), Presence::Absent);
    assert_eq!(sparse.get(5), None);

    // A dense leaf is a present operand everywhere, so a derived node
    // over it computes fill-derived values in every block.
    let negated = ops::arithmetic::neg(dense, GraphConfig::new(64, 1.0).dense()).unwrap();
    negated.recalculate_block(3);
    assert_eq!(negated.read_lane(63), Some(-1.0));
}

#[test]
fn allocation_mode_is_exposed() {
    assert_eq!(
        GraphConfig::new(8, 0.0_f32).dense().allocation(),
        Allocation::Dense
    );
}
