//! Logical operators over lane masks.
//!
//! Comparisons produce mask lanes of exactly `1.0` (true) or `0.0`
//! (false); the combinators treat any nonzero lane as true. `select` picks
//! per lane from its second or third operand by the first operand's mask.

use std::rc::Rc;

use crate::error::GraphError;
use crate::graph::{BinaryNode, BlockSource, GraphConfig, TernaryNode, UnaryNode};

type Source = Rc<dyn BlockSource<f32>>;

fn mask(condition: bool) -> f32 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn gt_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = mask(x > y);
    }
}

fn lt_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = mask(x < y);
    }
}

fn eq_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = mask(x == y);
    }
}

fn and_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = mask(x != 0.0 && y != 0.0);
    }
}

fn or_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = mask(x != 0.0 || y != 0.0);
    }
}

fn not_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = mask(x == 0.0);
    }
}

fn select_lanes(m: &[f32], a: &[f32], b: &[f32], out: &mut [f32]) {
    for (((o, &pick), &x), &y) in out.iter_mut().zip(m).zip(a).zip(b) {
        *o = if pick != 0.0 { x } else { y };
    }
}

/// Mask of `lhs > rhs`.
pub fn gt(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, gt_lanes)
}

/// Mask of `lhs < rhs`.
pub fn lt(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, lt_lanes)
}

/// Mask of `lhs == rhs`.
pub fn eq(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, eq_lanes)
}

/// Mask of both operands nonzero.
pub fn and(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, and_lanes)
}

/// Mask of either operand nonzero.
pub fn or(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, or_lanes)
}

/// Mask inversion: `1.0` where the input is zero.
pub fn not(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, not_lanes)
}

/// Per-lane pick: `if mask != 0 { a } else { b }`.
pub fn select(mask: Source, a: Source, b: Source, config: GraphConfig<f32>) -> Result<Rc<TernaryNode<f32>>, GraphError> {
    TernaryNode::new(mask, a, b, config, select_lanes)
}
