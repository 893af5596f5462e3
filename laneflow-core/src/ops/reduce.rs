//! Reduction-to-scalar operators.
//!
//! Each entry pairs a per-block reducer with an aggregator over the
//! present per-block partials. Absent blocks are skipped; an upstream with
//! zero present blocks reduces to absence, never to a computed zero.

use std::rc::Rc;

use crate::graph::{BlockSource, ReduceNode};

type Source = Rc<dyn BlockSource<f32>>;

fn block_sum(lanes: &[f32]) -> f32 {
    lanes.iter().sum()
}

fn block_mean(lanes: &[f32]) -> f32 {
    block_sum(lanes) / lanes.len() as f32
}

fn block_min(lanes: &[f32]) -> f32 {
    lanes.iter().copied().fold(f32::INFINITY, f32::min)
}

fn block_max(lanes: &[f32]) -> f32 {
    lanes.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn fold_sum(partials: &[f32]) -> f32 {
    partials.iter().sum()
}

fn fold_mean(partials: &[f32]) -> f32 {
    fold_sum(partials) / partials.len() as f32
}

fn fold_min(partials: &[f32]) -> f32 {
    partials.iter().copied().fold(f32::INFINITY, f32::min)
}

fn fold_max(partials: &[f32]) -> f32 {
    partials.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Sum of every lane in every present block.
pub fn sum(input: Source) -> Rc<ReduceNode<f32, f32>> {
    ReduceNode::new(input, block_sum, fold_sum)
}

/// Mean over present blocks: each present block reduces to its lane mean,
/// and the partials average. Unwritten lanes of a present block count at
/// the fill value; absent blocks do not count at all.
pub fn mean(input: Source) -> Rc<ReduceNode<f32, f32>> {
    ReduceNode::new(input, block_mean, fold_mean)
}

/// Smallest lane across present blocks.
pub fn min(input: Source) -> Rc<ReduceNode<f32, f32>> {
    ReduceNode::new(input, block_min, fold_min)
}

/// Largest lane across present blocks.
pub fn max(input: Source) -> Rc<ReduceNode<f32, f32>> {
    ReduceNode::new(input, block_max, fold_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BlockLeaf, GraphConfig, ScalarSource};

    fn config() -> GraphConfig<f32> {
        GraphConfig::new(32, 0.0)
    }

    #[test]
    fn mean_of_one_present_block() {
        let input = BlockLeaf::new(config());
        // Populate every lane of block 0 with 10, 20, 30, ..., 160.
        for lane in 0..16 {
            input.set(lane, (lane as f32 + 1.0) * 10.0);
        }

        let average = mean(Rc::clone(&input) as Source);
        assert_eq!(average.recalculate(), Some(85.0));
    }

    #[test]
    fn reductions_are_absent_without_present_blocks() {
        let input = BlockLeaf::new(config());
        assert_eq!(mean(Rc::clone(&input) as Source).recalculate(), None);
        assert_eq!(sum(Rc::clone(&input) as Source).recalculate(), None);
        assert_eq!(min(Rc::clone(&input) as Source).recalculate(), None);
        assert_eq!(max(input).recalculate(), None);
    }

    #[test]
    fn min_and_max_span_blocks() {
        let input = BlockLeaf::new(GraphConfig::new(32, 5.0));
        input.set(0, -3.0);
        input.set(17, 40.0);

        assert_eq!(min(Rc::clone(&input) as Source).recalculate(), Some(-3.0));
        assert_eq!(max(input).recalculate(), Some(40.0));
    }
}
