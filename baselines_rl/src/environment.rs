//! Environment abstraction consumed by the rollout collector.
//!
//! Provides the single-environment stepping interface, observation/action
//! space descriptors and an [`EpisodeMonitor`] wrapper that reports raw
//! episode statistics through [`StepInfo`].

use crate::error::{Result, RlError};

// ============================================================================
// Spaces
// ============================================================================

/// Observation or action space descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    /// `n` discrete choices, represented as a single float index.
    Discrete(usize),
    /// Bounded continuous box with per-dimension bounds.
    Box {
        /// Lower bound per dimension
        low: Vec<f32>,
        /// Upper bound per dimension
        high: Vec<f32>,
    },
}

impl Space {
    /// Create a bounded box, validating that bounds agree in length and order.
    pub fn bounded(low: Vec<f32>, high: Vec<f32>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(RlError::shape("box upper bound", low.len(), high.len()));
        }
        if let Some(i) = low.iter().zip(&high).position(|(l, h)| l > h) {
            return Err(RlError::InvalidConfig {
                param: "space",
                message: format!("low[{}]={} exceeds high[{}]={}", i, low[i], i, high[i]),
            });
        }
        Ok(Space::Box { low, high })
    }

    /// Box with the same bounds on every dimension.
    pub fn uniform_box(dim: usize, low: f32, high: f32) -> Self {
        Space::Box {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    /// Number of floats needed to represent one element of this space.
    pub fn dim(&self) -> usize {
        match self {
            Space::Discrete(_) => 1,
            Space::Box { low, .. } => low.len(),
        }
    }

    /// Whether this is a bounded continuous space.
    pub fn is_box(&self) -> bool {
        matches!(self, Space::Box { .. })
    }

    /// Clip an action into the space bounds.
    ///
    /// Discrete spaces are returned unchanged.
    pub fn clip(&self, action: &[f32]) -> Vec<f32> {
        match self {
            Space::Discrete(_) => action.to_vec(),
            Space::Box { low, high } => action
                .iter()
                .zip(low.iter().zip(high))
                .map(|(&a, (&l, &h))| a.max(l).min(h))
                .collect(),
        }
    }

    /// Check whether a point lies inside the space.
    pub fn contains(&self, x: &[f32]) -> bool {
        match self {
            Space::Discrete(n) => x.len() == 1 && x[0] >= 0.0 && (x[0] as usize) < *n && x[0].fract() == 0.0,
            Space::Box { low, high } => {
                x.len() == low.len()
                    && x.iter()
                        .zip(low.iter().zip(high))
                        .all(|(&v, (&l, &h))| v >= l && v <= h)
            }
        }
    }
}

// ============================================================================
// Step results
// ============================================================================

/// Raw episode statistics reported by a monitoring wrapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeInfo {
    /// Unshaped return of the finished episode
    pub ret: f32,
    /// Number of steps in the finished episode
    pub len: usize,
}

/// Auxiliary information attached to a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    /// Unshaped reward for this step when `reward` has been shaped.
    pub true_reward: Option<f32>,
    /// Present on the final step of an episode when a monitor is installed.
    pub episode: Option<EpisodeInfo>,
}

/// Result of stepping a single environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep {
    /// Observation after the step
    pub observation: Vec<f32>,
    /// Reward received
    pub reward: f32,
    /// Episode ended (terminal or truncated)
    pub done: bool,
    /// Auxiliary information
    pub info: StepInfo,
}

impl EnvStep {
    /// Create a step result with empty info.
    pub fn new(observation: Vec<f32>, reward: f32, done: bool) -> Self {
        Self {
            observation,
            reward,
            done,
            info: StepInfo::default(),
        }
    }
}

// ============================================================================
// Environment trait
// ============================================================================

/// Single (non-vectorized) environment.
///
/// Implementations do NOT auto-reset: after a step reports `done`, the caller
/// is expected to call [`Environment::reset`].
pub trait Environment {
    /// Reset to a fresh episode and return the initial observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Apply an action and advance one step.
    fn step(&mut self, action: &[f32]) -> Result<EnvStep>;

    /// Observation space descriptor.
    fn observation_space(&self) -> &Space;

    /// Action space descriptor.
    fn action_space(&self) -> &Space;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn reset(&mut self) -> Result<Vec<f32>> {
        (**self).reset()
    }

    fn step(&mut self, action: &[f32]) -> Result<EnvStep> {
        (**self).step(action)
    }

    fn observation_space(&self) -> &Space {
        (**self).observation_space()
    }

    fn action_space(&self) -> &Space {
        (**self).action_space()
    }
}

// ============================================================================
// EpisodeMonitor
// ============================================================================

/// Wrapper recording unshaped episode returns and lengths.
///
/// On the final step of every episode the wrapper fills
/// [`StepInfo::episode`], which the rollout collector prefers over its own
/// accumulated return.
pub struct EpisodeMonitor<E> {
    env: E,
    episode_return: f32,
    episode_len: usize,
    episode_returns: Vec<f32>,
    episode_lengths: Vec<usize>,
    total_steps: usize,
}

impl<E: Environment> EpisodeMonitor<E> {
    /// Wrap an environment.
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode_return: 0.0,
            episode_len: 0,
            episode_returns: Vec::new(),
            episode_lengths: Vec::new(),
            total_steps: 0,
        }
    }

    /// Returns of all finished episodes, oldest first.
    pub fn episode_returns(&self) -> &[f32] {
        &self.episode_returns
    }

    /// Lengths of all finished episodes, oldest first.
    pub fn episode_lengths(&self) -> &[usize] {
        &self.episode_lengths
    }

    /// Total steps taken through the wrapper.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Get a reference to the underlying environment.
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Get a mutable reference to the underlying environment.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Consume the wrapper and return the underlying environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Environment> Environment for EpisodeMonitor<E> {
    fn reset(&mut self) -> Result<Vec<f32>> {
        self.episode_return = 0.0;
        self.episode_len = 0;
        self.env.reset()
    }

    fn step(&mut self, action: &[f32]) -> Result<EnvStep> {
        let mut step = self.env.step(action)?;
        self.episode_return += step.reward;
        self.episode_len += 1;
        self.total_steps += 1;

        if step.done {
            let info = EpisodeInfo {
                ret: self.episode_return,
                len: self.episode_len,
            };
            self.episode_returns.push(info.ret);
            self.episode_lengths.push(info.len);
            step.info.episode = Some(info);
            self.episode_return = 0.0;
            self.episode_len = 0;
        }

        Ok(step)
    }

    fn observation_space(&self) -> &Space {
        self.env.observation_space()
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }
}
