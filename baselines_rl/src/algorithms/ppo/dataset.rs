//! Shuffled minibatch partitioning of a segment.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::policy::Minibatch;
use crate::rollout::Segment;

/// Training view of one segment: observations, actions, standardized
/// advantages and return targets, all indexed by step.
#[derive(Debug, Clone)]
pub struct SegmentDataset<'a> {
    segment: &'a Segment,
    advantages: Vec<f32>,
    returns: Vec<f32>,
}

impl<'a> SegmentDataset<'a> {
    /// Pair a segment with per-step advantages and returns.
    ///
    /// Callers ensure both vectors have `segment.len()` entries.
    pub fn new(segment: &'a Segment, advantages: Vec<f32>, returns: Vec<f32>) -> Self {
        debug_assert_eq!(advantages.len(), segment.len());
        debug_assert_eq!(returns.len(), segment.len());
        Self {
            segment,
            advantages,
            returns,
        }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.advantages.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.advantages.is_empty()
    }

    /// Advantages as passed to the strategy.
    pub fn advantages(&self) -> &[f32] {
        &self.advantages
    }

    /// Shuffle step indices and split them into minibatches of `batch_size`.
    ///
    /// The last minibatch may be shorter.
    pub fn shuffled_minibatches<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<Minibatch> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        indices
            .chunks(batch_size.max(1))
            .map(|chunk| self.gather(chunk))
            .collect()
    }

    /// Build a minibatch from the given step indices.
    pub fn gather(&self, indices: &[usize]) -> Minibatch {
        let seg = self.segment;
        Minibatch {
            observations: indices.iter().flat_map(|&i| seg.observation(i)).copied().collect(),
            actions: indices.iter().flat_map(|&i| seg.action(i)).copied().collect(),
            advantages: indices.iter().map(|&i| self.advantages[i]).collect(),
            returns: indices.iter().map(|&i| self.returns[i]).collect(),
            obs_dim: seg.obs_dim,
            act_dim: seg.act_dim,
        }
    }
}
