//! Fused multiply-add operators.
//!
//! The ternary form fuses per-lane (`f32::mul_add`, one rounding). The
//! scalar-augmented binary forms encode which position the scalar takes:
//! `(x + y) * s` against `(x * s) + y`.

use std::rc::Rc;

use crate::error::GraphError;
use crate::graph::{BinaryNode, BlockSource, GraphConfig, ScalarSource, TernaryNode};

type Source = Rc<dyn BlockSource<f32>>;
type Scalar = Rc<dyn ScalarSource<f32>>;

fn mul_add_lanes(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
    for (((o, &x), &y), &z) in out.iter_mut().zip(a).zip(b).zip(c) {
        *o = x.mul_add(y, z);
    }
}

fn add_mul_scalar_lanes(a: &[f32], b: &[f32], s: f32, out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = (x + y) * s;
    }
}

fn mul_scalar_add_lanes(a: &[f32], b: &[f32], s: f32, out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.mul_add(s, y);
    }
}

/// `out = a * b + c`, fused per lane.
pub fn mul_add(a: Source, b: Source, c: Source, config: GraphConfig<f32>) -> Result<Rc<TernaryNode<f32>>, GraphError> {
    TernaryNode::new(a, b, c, config, mul_add_lanes)
}

/// `out = (lhs + rhs) * s`: the scalar scales the sum.
pub fn add_mul_scalar(lhs: Source, rhs: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::with_scalar(lhs, rhs, s, config, add_mul_scalar_lanes)
}

/// `out = (lhs * s) + rhs`: the scalar scales the left operand only.
pub fn mul_scalar_add(lhs: Source, rhs: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<BinaryNode<f32>>, GraphError> {
    BinaryNode::with_scalar(lhs, rhs, s, config, mul_scalar_add_lanes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BlockLeaf, ScalarLeaf};

    fn config() -> GraphConfig<f32> {
        GraphConfig::new(32, 0.0)
    }

    #[test]
    fn mul_add_fuses_three_operands() {
        let a = BlockLeaf::new(config());
        let b = BlockLeaf::new(config());
        let c = BlockLeaf::new(config());
        a.set(0, 2.0);
        b.set(0, 3.0);
        c.set(0, 4.0);

        let node = mul_add(a, b, c, config()).unwrap();
        node.recalculate_block(0);
        assert_eq!(node.read_lane(0), Some(10.0));
    }

    #[test]
    fn scalar_position_distinguishes_the_two_fused_forms() {
        let a = BlockLeaf::new(config());
        let b = BlockLeaf::new(config());
        a.set(0, 2.0);
        b.set(0, 3.0);
        let s = ScalarLeaf::with_value(4.0);

        let sum_scaled = add_mul_scalar(
            Rc::clone(&a) as Source,
            Rc::clone(&b) as Source,
            Rc::clone(&s) as Scalar,
            config(),
        )
        .unwrap();
        let lhs_scaled = mul_scalar_add(a, b, s, config()).unwrap();

        sum_scaled.recalculate_block(0);
        lhs_scaled.recalculate_block(0);
        assert_eq!(sum_scaled.read_lane(0), Some(20.0)); // (2 + 3) * 4
        assert_eq!(lhs_scaled.read_lane(0), Some(11.0)); // 2 * 4 + 3
    }
}
