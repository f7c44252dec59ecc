//! Configuration for PPO training.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RlError};
use crate::policy::UpdateContext;
use crate::scheduling::{LRScheduler, Schedule, ScheduledLR};

/// Configuration for the PPO update loop and trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PPOConfig {
    /// Discount factor
    pub gamma: f32,
    /// GAE lambda parameter
    pub lam: f32,
    /// Environment steps per segment
    pub timesteps_per_batch: usize,
    /// PPO clipping parameter (annealed by the LR multiplier)
    pub clip_param: f32,
    /// Entropy bonus coefficient
    pub entcoeff: f32,
    /// Passes over each segment
    pub optim_epochs: usize,
    /// Base learning rate
    pub optim_stepsize: f64,
    /// Minibatch size; `None` or `Some(0)` uses the whole segment
    pub optim_batchsize: Option<usize>,
    /// Optimizer epsilon
    pub adam_epsilon: f64,
    /// Learning-rate schedule name, parsed when an update runs
    pub schedule: String,
    /// Seed for minibatch shuffling (`None` = entropy-seeded)
    pub seed: Option<u64>,
    /// Number of recent episodes averaged in training statistics
    pub episode_window: usize,
}

impl Default for PPOConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            lam: 0.95,
            timesteps_per_batch: 2048,
            clip_param: 0.2,
            entcoeff: 0.01,
            optim_epochs: 4,
            optim_stepsize: 3e-4,
            optim_batchsize: Some(128),
            adam_epsilon: 1e-5,
            schedule: "constant".to_string(),
            seed: None,
            episode_window: 100,
        }
    }
}

impl PPOConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the discount factor.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the GAE lambda.
    pub fn with_lam(mut self, lam: f32) -> Self {
        self.lam = lam;
        self
    }

    /// Set the segment length.
    pub fn with_timesteps_per_batch(mut self, n: usize) -> Self {
        self.timesteps_per_batch = n;
        self
    }

    /// Set the clipping parameter.
    pub fn with_clip_param(mut self, clip_param: f32) -> Self {
        self.clip_param = clip_param;
        self
    }

    /// Set the entropy coefficient.
    pub fn with_entcoeff(mut self, entcoeff: f32) -> Self {
        self.entcoeff = entcoeff;
        self
    }

    /// Set the number of epochs per segment.
    pub fn with_optim_epochs(mut self, epochs: usize) -> Self {
        self.optim_epochs = epochs;
        self
    }

    /// Set the base learning rate.
    pub fn with_optim_stepsize(mut self, lr: f64) -> Self {
        self.optim_stepsize = lr;
        self
    }

    /// Set the minibatch size.
    pub fn with_optim_batchsize(mut self, batchsize: Option<usize>) -> Self {
        self.optim_batchsize = batchsize;
        self
    }

    /// Set the optimizer epsilon.
    pub fn with_adam_epsilon(mut self, eps: f64) -> Self {
        self.adam_epsilon = eps;
        self
    }

    /// Set the learning-rate schedule name.
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = schedule.into();
        self
    }

    /// Set the shuffling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the episode statistics window.
    pub fn with_episode_window(mut self, window: usize) -> Self {
        self.episode_window = window;
        self
    }

    /// Parse the configured schedule name.
    pub fn parsed_schedule(&self) -> Result<Schedule> {
        self.schedule.parse()
    }

    /// Minibatch size for a segment of `n` steps.
    pub fn minibatch_size(&self, n: usize) -> usize {
        match self.optim_batchsize {
            None | Some(0) => n,
            Some(b) => b.min(n),
        }
    }

    /// Clipping parameter annealed by the current LR multiplier.
    pub fn clip_range(&self, lr_mult: f32) -> f32 {
        self.clip_param * lr_mult
    }

    /// Hyperparameters handed to the strategy for a segment collected at
    /// `timesteps_so_far` out of `total_timesteps`.
    pub fn update_context(&self, schedule: Schedule, timesteps_so_far: usize, total_timesteps: usize) -> UpdateContext {
        let lr = ScheduledLR::new(self.optim_stepsize, schedule, total_timesteps);
        let lr_mult = schedule.value(timesteps_so_far, total_timesteps) as f32;
        UpdateContext {
            lr_mult,
            learning_rate: lr.get_lr(timesteps_so_far),
            clip_range: self.clip_range(lr_mult),
            entcoeff: self.entcoeff,
            adam_epsilon: self.adam_epsilon,
        }
    }

    /// Validate numeric parameters.
    ///
    /// The schedule name is checked when an update runs, not here.
    pub fn validate(&self) -> Result<()> {
        // a single-step segment has zero advantage variance
        if self.timesteps_per_batch < 2 {
            return Err(invalid(
                "timesteps_per_batch",
                format!("must be >= 2, got {}", self.timesteps_per_batch),
            ));
        }
        if self.optim_epochs == 0 {
            return Err(invalid("optim_epochs", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(invalid("gamma", format!("must be in [0, 1], got {}", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.lam) {
            return Err(invalid("lam", format!("must be in [0, 1], got {}", self.lam)));
        }
        if !(self.clip_param >= 0.0 && self.clip_param.is_finite()) {
            return Err(invalid("clip_param", format!("must be finite and >= 0, got {}", self.clip_param)));
        }
        if !self.entcoeff.is_finite() {
            return Err(invalid("entcoeff", format!("must be finite, got {}", self.entcoeff)));
        }
        if !(self.adam_epsilon > 0.0 && self.adam_epsilon.is_finite()) {
            return Err(invalid(
                "adam_epsilon",
                format!("must be finite and > 0, got {}", self.adam_epsilon),
            ));
        }
        if !(self.optim_stepsize >= 0.0 && self.optim_stepsize.is_finite()) {
            return Err(invalid(
                "optim_stepsize",
                format!("must be finite and >= 0, got {}", self.optim_stepsize),
            ));
        }
        if self.episode_window == 0 {
            return Err(invalid("episode_window", "must be > 0"));
        }
        Ok(())
    }
}

fn invalid(param: &'static str, message: impl Into<String>) -> RlError {
    RlError::InvalidConfig {
        param,
        message: message.into(),
    }
}
