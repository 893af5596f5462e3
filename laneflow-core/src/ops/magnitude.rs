//! Magnitude comparisons and range operators.

use std::rc::Rc;

use crate::error::GraphError;
use crate::graph::{BinaryNode, BlockSource, GraphConfig, TernaryNode};

type Source = Rc<dyn BlockSource<f32>>;

fn min_by_magnitude_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = if x.abs() <= y.abs() { x } else { y };
    }
}

fn max_by_magnitude_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = if x.abs() >= y.abs() { x } else { y };
    }
}

// max-then-min rather than f32::clamp: an inverted range from upstream
// data must not panic mid-pull.
fn clamp_lanes(x: &[f32], lo: &[f32], hi: &[f32], out: &mut [f32]) {
    for (((o, &v), &l), &h) in out.iter_mut().zip(x).zip(lo).zip(hi) {
        *o = v.max(l).min(h);
    }
}

fn lerp_lanes(a: &[f32], b: &[f32], t: &[f32], out: &mut [f32]) {
    for (((o, &x), &y), &w) in out.iter_mut().zip(a).zip(b).zip(t) {
        *o = (y - x).mul_add(w, x);
    }
}

/// Per lane, the operand with the smaller absolute value (ties keep the
/// left side).
pub fn min_by_magnitude(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, min_by_magnitude_lanes)
}

/// Per lane, the operand with the larger absolute value (ties keep the
/// left side).
pub fn max_by_magnitude(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, max_by_magnitude_lanes)
}

/// Per-lane clamp of `x` into `[lo, hi]`.
pub fn clamp(x: Source, lo: Source, hi: Source, config: GraphConfig<f32>) -> Result<Rc<TernaryNode<f32>>, GraphError> {
    TernaryNode::new(x, lo, hi, config, clamp_lanes)
}

/// Per-lane linear interpolation `a + (b - a) * t`.
pub fn lerp(a: Source, b: Source, t: Source, config: GraphConfig<f32>) -> Result<Rc<TernaryNode<f32>>, GraphError> {
    TernaryNode::new(a, b, t, config, lerp_lanes)
}
