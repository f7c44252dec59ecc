//! Policy and model-update interfaces.
//!
//! The training core never touches model parameters directly. It talks to
//! two capabilities:
//!
//! - [`Policy`]: maps a batch of observations to actions and value estimates
//!   (used by the rollout collector).
//! - [`UpdateStrategy`]: computes the surrogate losses for a [`Minibatch`],
//!   applies (or skips, for evaluation) a gradient step, and keeps the frozen
//!   reference policy used for KL and probability-ratio terms.
//!
//! A concrete actor-critic model usually implements both traits on the same
//! type, which is what [`PPOTrainer`](crate::algorithms::ppo::PPOTrainer)
//! expects.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

// ============================================================================
// Policy
// ============================================================================

/// Output of a policy forward pass over `n` observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyOutput {
    /// Flattened actions: [n * act_dim]
    pub actions: Vec<f32>,
    /// Value estimates V(s): [n]
    pub values: Vec<f32>,
    /// Implementation-defined per-observation extras (e.g. negative log-probs).
    /// Ignored by the collector.
    pub extra: Vec<f32>,
}

impl PolicyOutput {
    /// Create an output without extras.
    pub fn new(actions: Vec<f32>, values: Vec<f32>) -> Self {
        Self {
            actions,
            values,
            extra: Vec::new(),
        }
    }
}

/// Stepping policy queried during rollout collection.
pub trait Policy {
    /// Compute actions and value estimates for a batch of observations.
    ///
    /// `observations` is flattened: [n_obs * obs_dim].
    fn step(&mut self, observations: &[f32], n_obs: usize) -> Result<PolicyOutput>;
}

impl<P: Policy + ?Sized> Policy for &mut P {
    fn step(&mut self, observations: &[f32], n_obs: usize) -> Result<PolicyOutput> {
        (**self).step(observations, n_obs)
    }
}

// ============================================================================
// Minibatch
// ============================================================================

/// One minibatch handed to the update strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Minibatch {
    /// Flattened observations: [len * obs_dim]
    pub observations: Vec<f32>,
    /// Flattened actions: [len * act_dim]
    pub actions: Vec<f32>,
    /// Standardized advantages: [len]
    pub advantages: Vec<f32>,
    /// TD(λ) return targets: [len]
    pub returns: Vec<f32>,
    /// Observation dimension
    pub obs_dim: usize,
    /// Action dimension
    pub act_dim: usize,
}

impl Minibatch {
    /// Number of samples in the minibatch.
    pub fn len(&self) -> usize {
        self.advantages.len()
    }

    /// Check if the minibatch is empty.
    pub fn is_empty(&self) -> bool {
        self.advantages.is_empty()
    }

    /// Observation of sample `i`.
    pub fn observation(&self, i: usize) -> &[f32] {
        &self.observations[i * self.obs_dim..(i + 1) * self.obs_dim]
    }

    /// Action of sample `i`.
    pub fn action(&self, i: usize) -> &[f32] {
        &self.actions[i * self.act_dim..(i + 1) * self.act_dim]
    }
}

// ============================================================================
// LossStats
// ============================================================================

/// Named scalar losses reported by one update or evaluation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossStats {
    /// Clipped surrogate policy loss
    pub pol_surr: f32,
    /// Entropy penalty (`-entcoeff * mean entropy`)
    pub pol_entpen: f32,
    /// Value-function loss
    pub vf_loss: f32,
    /// Mean KL divergence from the reference policy
    pub kl: f32,
    /// Mean policy entropy
    pub ent: f32,
    /// Additional strategy-specific scalars
    pub extra: BTreeMap<String, f32>,
}

impl LossStats {
    /// Names of the mandatory losses, in reporting order.
    pub const NAMES: [&'static str; 5] = ["pol_surr", "pol_entpen", "vf_loss", "kl", "ent"];

    /// Create stats with the five mandatory losses.
    pub fn new(pol_surr: f32, pol_entpen: f32, vf_loss: f32, kl: f32, ent: f32) -> Self {
        Self {
            pol_surr,
            pol_entpen,
            vf_loss,
            kl,
            ent,
            extra: BTreeMap::new(),
        }
    }

    /// Attach an extra named scalar.
    pub fn with_extra(mut self, name: impl Into<String>, value: f32) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Look up a loss by name (mandatory or extra).
    pub fn get(&self, name: &str) -> Option<f32> {
        match name {
            "pol_surr" => Some(self.pol_surr),
            "pol_entpen" => Some(self.pol_entpen),
            "vf_loss" => Some(self.vf_loss),
            "kl" => Some(self.kl),
            "ent" => Some(self.ent),
            other => self.extra.get(other).copied(),
        }
    }

    /// Mandatory losses in reporting order.
    pub fn values(&self) -> [f32; 5] {
        [self.pol_surr, self.pol_entpen, self.vf_loss, self.kl, self.ent]
    }

    /// Sum of the optimized terms (surrogate + entropy penalty + value loss).
    pub fn total(&self) -> f32 {
        self.pol_surr + self.pol_entpen + self.vf_loss
    }

    /// Element-wise mean over several stats.
    ///
    /// Extra scalars are averaged over the entries that report them.
    /// Returns default (all zero) stats for an empty slice.
    pub fn mean(stats: &[LossStats]) -> LossStats {
        if stats.is_empty() {
            return LossStats::default();
        }
        let n = stats.len() as f32;
        let mut sums = [0.0f32; 5];
        let mut extra: BTreeMap<String, (f32, usize)> = BTreeMap::new();
        for s in stats {
            for (acc, v) in sums.iter_mut().zip(s.values()) {
                *acc += v;
            }
            for (k, v) in &s.extra {
                let e = extra.entry(k.clone()).or_insert((0.0, 0));
                e.0 += v;
                e.1 += 1;
            }
        }
        LossStats {
            pol_surr: sums[0] / n,
            pol_entpen: sums[1] / n,
            vf_loss: sums[2] / n,
            kl: sums[3] / n,
            ent: sums[4] / n,
            extra: extra
                .into_iter()
                .map(|(k, (sum, count))| (k, sum / count as f32))
                .collect(),
        }
    }
}

impl fmt::Display for LossStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in Self::NAMES.iter().zip(self.values()).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:.5}", name, value)?;
        }
        for (name, value) in &self.extra {
            write!(f, ", {}={:.5}", name, value)?;
        }
        Ok(())
    }
}

// ============================================================================
// UpdateStrategy
// ============================================================================

/// Hyperparameters in effect for one update or evaluation call.
///
/// Scheduled values (`learning_rate`, `clip_range`) are already multiplied
/// by `lr_mult`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateContext {
    /// Schedule multiplier for the current segment
    pub lr_mult: f32,
    /// Scheduled learning rate (`optim_stepsize * lr_mult`)
    pub learning_rate: f64,
    /// Annealed clipping parameter (`clip_param * lr_mult`)
    pub clip_range: f32,
    /// Entropy bonus coefficient
    pub entcoeff: f32,
    /// Optimizer epsilon
    pub adam_epsilon: f64,
}

/// Injected "compute losses and apply gradient" capability.
pub trait UpdateStrategy {
    /// Copy the current trainable parameters into the frozen reference policy.
    ///
    /// The copy must be a point-in-time snapshot, not an alias.
    fn sync_reference(&mut self) -> Result<()>;

    /// Compute losses on `batch` and apply one optimizer step with the
    /// hyperparameters in `ctx`.
    fn update(&mut self, batch: &Minibatch, ctx: &UpdateContext) -> Result<LossStats>;

    /// Compute losses on `batch` without touching parameters.
    fn evaluate(&mut self, batch: &Minibatch, ctx: &UpdateContext) -> Result<LossStats>;
}

impl<S: UpdateStrategy + ?Sized> UpdateStrategy for &mut S {
    fn sync_reference(&mut self) -> Result<()> {
        (**self).sync_reference()
    }

    fn update(&mut self, batch: &Minibatch, ctx: &UpdateContext) -> Result<LossStats> {
        (**self).update(batch, ctx)
    }

    fn evaluate(&mut self, batch: &Minibatch, ctx: &UpdateContext) -> Result<LossStats> {
        (**self).evaluate(batch, ctx)
    }
}
