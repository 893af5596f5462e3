//! Transcendental operators.

use std::rc::Rc;

use crate::error::GraphError;
use crate::graph::{BlockSource, GraphConfig, ScalarSource, UnaryNode};

type Source = Rc<dyn BlockSource<f32>>;
type Scalar = Rc<dyn ScalarSource<f32>>;

fn exp_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.exp();
    }
}

fn ln_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.ln();
    }
}

fn sin_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.sin();
    }
}

fn cos_lanes(a: &[f32], out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.cos();
    }
}

fn pow_scalar_lanes(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.powf(s);
    }
}

/// `out = e^input`.
pub fn exp(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, exp_lanes)
}

/// `out = ln(input)`.
pub fn ln(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, ln_lanes)
}

/// `out = sin(input)`.
pub fn sin(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, sin_lanes)
}

/// `out = cos(input)`.
pub fn cos(input: Source, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::new(input, config, cos_lanes)
}

/// `out = input ^ s`.
pub fn pow_scalar(input: Source, s: Scalar, config: GraphConfig<f32>) -> Result<Rc<UnaryNode<f32>>, GraphError> {
    UnaryNode::with_scalar(input, s, config, pow_scalar_lanes)
}
