//! Arithmetic operators: lane-wise binary, unary, and scalar-augmented
//! forms.

use std::rc::Rc;

use crate::error::GraphError;
use crate::graph::{BinaryNode, BlockSource, GraphConfig, ScalarSource, UnaryNode};

type Source = Rc<dyn BlockSource<f32>>;
type Scalar = Rc<dyn ScalarSource<f32>>;

fn add_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x + y;
    }
}

fn sub_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x - y;
    }
}

fn mul_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x * y;
    }
}

fn div_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x / y;
    }
}

fn min_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.min(y);
    }
}

fn max_lanes(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.max(y);
    }
}

fn neg_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = -x;
    }
}

fn abs_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.abs();
    }
}

fn floor_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.floor();
    }
}

fn ceil_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.ceil();
    }
}

fn sqrt_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.sqrt();
    }
}

fn signum_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.signum();
    }
}

fn add_scalar_lanes(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x + s;
    }
}

fn sub_scalar_lanes(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x - s;
    }
}

fn scalar_sub_lanes(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = s - x;
    }
}

fn mul_scalar_lanes(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x * s;
    }
}

fn div_scalar_lanes(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x / s;
    }
}

/// `out = lhs + rhs`.
pub fn add(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, add_lanes)
}

/// `out = lhs - rhs`.
pub fn sub(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, sub_lanes)
}

/// `out = lhs * rhs`.
pub fn mul(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, mul_lanes)
}

/// `out = lhs / rhs`.
pub fn div(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, div_lanes)
}

/// Lane-wise minimum of two nodes.
pub fn min(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, min_lanes)
}

/// Lane-wise maximum of two nodes.
pub fn max(lhs: Source, rhs: Source, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::new(lhs, rhs, config, max_lanes)
}

/// `out = -input`.
pub fn neg(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, neg_lanes)
}

/// `out = |input|`.
pub fn abs(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, abs_lanes)
}

/// `out = floor(input)`.
pub fn floor(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, floor_lanes)
}

/// `out = ceil(input)`.
pub fn ceil(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, ceil_lanes)
}

/// `out = sqrt(input)`.
pub fn sqrt(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, sqrt_lanes)
}

/// `out = signum(input)`.
pub fn signum(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, signum_lanes)
}

/// `out = input + s`.
pub fn add_scalar(input: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::with_scalar(input, s, config, add_scalar_lanes)
}

/// `out = input - s`.
pub fn sub_scalar(input: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::with_scalar(input, s, config, sub_scalar_lanes)
}

/// `out = s - input` (the scalar on the left).
pub fn scalar_sub(input: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::with_scalar(input, s, config, scalar_sub_lanes)
}

/// `out = input * s`.
pub fn mul_scalar(input: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::with_scalar(input, s, config, mul_scalar_lanes)
}

/// `out = input / s`.
pub fn div_scalar(input: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::with_scalar(input, s, config, div_scalar_lanes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BlockLeaf, ScalarLeaf};

    fn config() -> GraphConfig<f32> {
        GraphConfig::new(32, 0.0)
    }

    #[test]
    fn add_sums_lanes() {
        let a = BlockLeaf::new(config());
        let b = BlockLeaf::new(config());
        a.set(0, 3.0);
        b.set(0, 4.0);

        let sum = add(a, b, config()).unwrap();
        sum.recalculate_block(0);
        assert_eq!(sum.read_lane(0), Some(7.0));
    }

    #[test]
    fn scalar_side_matters_for_subtraction() {
        let a = BlockLeaf::new(config());
        a.set(0, 10.0);
        let s = ScalarLeaf::with_value(3.0);

        let right = sub_scalar(
            Rc::clone(&a) as Source,
            Rc::clone(&s) as Scalar,
            config(),
        )
        .unwrap();
        let left = scalar_sub(Rc::clone(&a) as Source, s, config()).unwrap();

        right.recalculate_block(0);
        left.recalculate_block(0);
        assert_eq!(right.read_lane(0), Some(7.0));
        assert_eq!(left.read_lane(0), Some(-7.0));
    }

    #[test]
    fn mul_scalar_scales_every_populated_lane() {
        let a = BlockLeaf::new(config());
        for lane in 0..16 {
            a.set(lane, 2.0);
        }
        let s = ScalarLeaf::with_value(3.0);

        let scaled = mul_scalar(a, s, config()).unwrap();
        scaled.recalculate_block(0);
        for lane in 0..16 {
            assert_eq!(scaled.read_lane(lane), Some(6.0));
        }
    }

    #[test]
    fn unary_maps_apply_lane_wise() {
        let a = BlockLeaf::new(config());
        a.set(0, -2.25);
        a.set(1, 4.0);

        let absolute = abs(Rc::clone(&a) as Source, config()).unwrap();
        absolute.recalculate_block(0);
        assert_eq!(absolute.read_lane(0), Some(2.25));

        let floored = floor(Rc::clone(&a) as Source, config()).unwrap();
        floored.recalculate_block(0);
        assert_eq!(floored.read_lane(0), Some(-3.0));

        let roots = sqrt(a, config()).unwrap();
        roots.recalculate_block(0);
        assert_eq!(roots.read_lane(1), Some(2.0));
    }
}
