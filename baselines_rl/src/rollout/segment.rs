//! Fixed-length slice of on-policy interaction data.

/// One segment of `n_samples` chronologically ordered steps.
///
/// Per-step arrays all have length `n_samples` (flattened arrays have length
/// `n_samples * dim`). Episode summaries hold one entry per episode that
/// completed inside this segment and may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Flattened observations: [n_samples * obs_dim]
    pub observations: Vec<f32>,
    /// Flattened (unclipped) policy actions: [n_samples * act_dim]
    pub actions: Vec<f32>,
    /// Rewards as returned by the environment: [n_samples]
    pub rewards: Vec<f32>,
    /// Unshaped rewards: [n_samples]
    pub true_rewards: Vec<f32>,
    /// Value predictions V(s_t): [n_samples]
    pub vpreds: Vec<f32>,
    /// Episode ended on this step: [n_samples]
    pub dones: Vec<bool>,
    /// This step is the first of an episode: [n_samples]
    pub episode_starts: Vec<bool>,
    /// Bootstrap value of the state following the last step, already zeroed
    /// when that state begins a new episode.
    pub next_value: f32,
    /// Returns of episodes completed in this segment
    pub ep_rets: Vec<f32>,
    /// Unshaped returns of episodes completed in this segment
    pub ep_true_rets: Vec<f32>,
    /// Lengths of episodes completed in this segment
    pub ep_lens: Vec<usize>,
    /// Environment steps taken while forming this segment
    pub total_timestep: usize,
    /// Observation dimension
    pub obs_dim: usize,
    /// Action dimension
    pub act_dim: usize,
}

impl Segment {
    /// Zero-filled segment with room for `n_samples` steps.
    pub fn zeroed(n_samples: usize, obs_dim: usize, act_dim: usize) -> Self {
        Self {
            observations: vec![0.0; n_samples * obs_dim],
            actions: vec![0.0; n_samples * act_dim],
            rewards: vec![0.0; n_samples],
            true_rewards: vec![0.0; n_samples],
            vpreds: vec![0.0; n_samples],
            dones: vec![false; n_samples],
            episode_starts: vec![false; n_samples],
            next_value: 0.0,
            ep_rets: Vec::new(),
            ep_true_rets: Vec::new(),
            ep_lens: Vec::new(),
            total_timestep: 0,
            obs_dim,
            act_dim,
        }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Check if the segment holds no steps.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Observation at step `t`.
    pub fn observation(&self, t: usize) -> &[f32] {
        &self.observations[t * self.obs_dim..(t + 1) * self.obs_dim]
    }

    /// Action at step `t`.
    pub fn action(&self, t: usize) -> &[f32] {
        &self.actions[t * self.act_dim..(t + 1) * self.act_dim]
    }

    /// Number of episodes completed in this segment.
    pub fn n_episodes(&self) -> usize {
        self.ep_lens.len()
    }

    /// Mean return of completed episodes, `None` if none completed.
    pub fn mean_episode_return(&self) -> Option<f32> {
        if self.ep_rets.is_empty() {
            None
        } else {
            Some(self.ep_rets.iter().sum::<f32>() / self.ep_rets.len() as f32)
        }
    }

    pub(crate) fn clear_episode_summaries(&mut self) {
        self.ep_rets.clear();
        self.ep_true_rets.clear();
        self.ep_lens.clear();
    }
}
