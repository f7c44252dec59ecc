//! Minibatch optimization passes over one segment.
//!
//! ```text
//! ctx = { lr_mult, optim_stepsize * lr_mult, clip_param * lr_mult, entcoeff, adam_epsilon }
//! adv = standardize(adv)
//! strategy.sync_reference()
//! for epoch in 0..optim_epochs:
//!     for mb in shuffle(segment).chunks(optim_batchsize):
//!         strategy.update(mb, ctx)
//! for mb in shuffle(segment).chunks(optim_batchsize):
//!     strategy.evaluate(mb, ctx)        // reported mean losses
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algorithms::gae::{normalize_advantages, Advantages};
use crate::error::{Result, RlError};
use crate::policy::{LossStats, UpdateContext, UpdateStrategy};
use crate::rollout::Segment;

use super::config::PPOConfig;
use super::dataset::SegmentDataset;

/// Result of one call to [`PolicyUpdateLoop::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    /// Mean losses of the post-training evaluation pass
    pub mean_losses: LossStats,
    /// Mean training losses per epoch
    pub epoch_losses: Vec<LossStats>,
    /// Learning-rate multiplier used for every minibatch
    pub lr_mult: f32,
    /// Hyperparameters handed to the strategy
    pub context: UpdateContext,
    /// Value predictions recorded while collecting the segment
    pub vpred_before: Vec<f32>,
    /// Return targets the value function was trained on
    pub tdlamret: Vec<f32>,
    /// Minibatches per epoch
    pub n_minibatches: usize,
}

impl UpdateSummary {
    /// Fraction of return variance explained by the pre-update value predictions.
    pub fn explained_variance(&self) -> Option<f32> {
        explained_variance(&self.vpred_before, &self.tdlamret)
    }
}

/// `1 - Var[y - ypred] / Var[y]`. `None` when `y` has zero variance or
/// the lengths differ.
pub fn explained_variance(ypred: &[f32], y: &[f32]) -> Option<f32> {
    if y.is_empty() || ypred.len() != y.len() {
        return None;
    }
    let var_y = variance(y.iter().map(|&v| v as f64));
    if var_y == 0.0 {
        return None;
    }
    let var_res = variance(y.iter().zip(ypred).map(|(&a, &b)| a as f64 - b as f64));
    Some((1.0 - var_res / var_y) as f32)
}

fn variance(xs: impl Iterator<Item = f64>) -> f64 {
    let v: Vec<f64> = xs.collect();
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
}

/// Drives repeated minibatch passes of an [`UpdateStrategy`] over a segment.
#[derive(Debug, Clone)]
pub struct PolicyUpdateLoop {
    config: PPOConfig,
    rng: StdRng,
}

impl PolicyUpdateLoop {
    /// Create an update loop. Validates the numeric configuration.
    pub fn new(config: PPOConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PPOConfig {
        &self.config
    }

    /// Run `optim_epochs` training passes plus one evaluation pass.
    ///
    /// # Errors
    ///
    /// - `Configuration` for an unknown schedule name (before any strategy call)
    /// - `Shape` for an empty segment or mismatched advantage lengths
    /// - `DegenerateAdvantage` when advantages cannot be standardized
    /// - anything the strategy returns
    pub fn update<S: UpdateStrategy + ?Sized>(
        &mut self,
        strategy: &mut S,
        segment: &Segment,
        advantages: &Advantages,
        timesteps_so_far: usize,
        total_timesteps: usize,
    ) -> Result<UpdateSummary> {
        let schedule = self.config.parsed_schedule()?;
        let ctx = self.config.update_context(schedule, timesteps_so_far, total_timesteps);

        let n = segment.len();
        if advantages.adv.len() != n {
            return Err(RlError::shape("advantages", n, advantages.adv.len()));
        }
        if advantages.tdlamret.len() != n {
            return Err(RlError::shape("tdlamret", n, advantages.tdlamret.len()));
        }

        let mut adv = advantages.adv.clone();
        normalize_advantages(&mut adv)?;
        let data = SegmentDataset::new(segment, adv, advantages.tdlamret.clone());
        let batch_size = self.config.minibatch_size(n);

        strategy.sync_reference()?;

        let epochs = self.config.optim_epochs;
        let mut epoch_losses = Vec::with_capacity(epochs);
        let mut n_minibatches = 0;
        for epoch in 0..epochs {
            let batches = data.shuffled_minibatches(batch_size, &mut self.rng);
            n_minibatches = batches.len();

            let mut losses = Vec::with_capacity(batches.len());
            for batch in &batches {
                losses.push(strategy.update(batch, &ctx)?);
            }
            let mean = LossStats::mean(&losses);
            log::debug!("Epoch {}/{}: {}", epoch + 1, epochs, mean);
            epoch_losses.push(mean);
        }

        let batches = data.shuffled_minibatches(batch_size, &mut self.rng);
        let mut eval_losses = Vec::with_capacity(batches.len());
        for batch in &batches {
            eval_losses.push(strategy.evaluate(batch, &ctx)?);
        }
        let mean_losses = LossStats::mean(&eval_losses);
        log::debug!(
            "Evaluation ({} minibatches, lr={:.3e}, clip={:.4}): {}",
            batches.len(),
            ctx.learning_rate,
            ctx.clip_range,
            mean_losses
        );

        Ok(UpdateSummary {
            mean_losses,
            epoch_losses,
            lr_mult: ctx.lr_mult,
            context: ctx,
            vpred_before: segment.vpreds.clone(),
            tdlamret: advantages.tdlamret.clone(),
            n_minibatches,
        })
    }
}
