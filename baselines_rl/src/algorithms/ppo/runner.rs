//! Single-environment PPO training loop.
//!
//! Each iteration pulls one segment from the collector, estimates advantages
//! with GAE and runs the update loop on it:
//!
//! ```text
//! ┌──────────────────┐ segment ┌─────┐ adv, tdlamret ┌──────────────────┐
//! │ RolloutCollector │───────>│ GAE │──────────────>│ PolicyUpdateLoop │
//! └──────────────────┘         └─────┘               └──────────────────┘
//!          ^                                                   │
//!          └────────────── agent (Policy + UpdateStrategy) ────┘
//! ```
//!
//! The agent is borrowed by the collector for stepping and by the update
//! loop for optimization, never both at once.

use std::collections::VecDeque;
use std::time::Instant;

use crate::algorithms::gae::compute_gae;
use crate::environment::Environment;
use crate::error::Result;
use crate::policy::{LossStats, Policy, UpdateStrategy};
use crate::rollout::RolloutCollector;

use super::config::PPOConfig;
use super::update::{PolicyUpdateLoop, UpdateSummary};

/// Training progress reported after each iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingStats {
    /// Completed iterations (segments consumed)
    pub iterations: usize,
    /// Environment steps consumed by training
    pub timesteps: usize,
    /// Episodes completed since training started
    pub episodes: usize,
    /// Episodes completed in the last segment
    pub episodes_this_iter: usize,
    /// Mean return over the recent episode window
    pub mean_episode_return: Option<f32>,
    /// Mean length over the recent episode window
    pub mean_episode_length: Option<f32>,
    /// Learning-rate multiplier of the last update
    pub lr_mult: f32,
    /// Scheduled learning rate of the last update
    pub learning_rate: f64,
    /// Mean evaluation losses of the last update
    pub last_losses: Option<LossStats>,
    /// Explained variance of the value predictions of the last segment
    pub explained_variance: Option<f32>,
    /// Wall-clock seconds since `learn` started
    pub time_elapsed: f32,
}

/// PPO trainer owning the collector, the update loop and the agent.
pub struct PPOTrainer<E, A> {
    config: PPOConfig,
    collector: RolloutCollector<E>,
    update_loop: PolicyUpdateLoop,
    agent: A,
    timesteps_so_far: usize,
    iterations: usize,
    episodes_so_far: usize,
    recent_returns: VecDeque<f32>,
    recent_lengths: VecDeque<usize>,
}

impl<E, A> PPOTrainer<E, A>
where
    E: Environment,
    A: Policy + UpdateStrategy,
{
    /// Create a trainer. Resets the environment.
    pub fn new(config: PPOConfig, env: E, agent: A) -> Result<Self> {
        config.validate()?;
        let collector = RolloutCollector::new(env, config.timesteps_per_batch)?;
        let update_loop = PolicyUpdateLoop::new(config.clone())?;
        Ok(Self {
            recent_returns: VecDeque::with_capacity(config.episode_window),
            recent_lengths: VecDeque::with_capacity(config.episode_window),
            config,
            collector,
            update_loop,
            agent,
            timesteps_so_far: 0,
            iterations: 0,
            episodes_so_far: 0,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PPOConfig {
        &self.config
    }

    /// Get a reference to the agent.
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Get a mutable reference to the agent.
    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    /// Consume the trainer and return the agent.
    pub fn into_agent(self) -> A {
        self.agent
    }

    /// Environment steps consumed so far.
    pub fn timesteps_so_far(&self) -> usize {
        self.timesteps_so_far
    }

    /// Train until `total_timesteps` environment steps have been consumed.
    ///
    /// `callback` runs after every iteration; returning `false` stops
    /// training. Calling `learn` again continues from the current counters.
    pub fn learn<F>(&mut self, total_timesteps: usize, mut callback: F) -> Result<TrainingStats>
    where
        F: FnMut(&TrainingStats) -> bool,
    {
        let start = Instant::now();
        let mut stats = self.snapshot(0, None, start);

        while self.timesteps_so_far < total_timesteps {
            let segment = self.collector.next_segment(&mut self.agent)?;
            let advantages = compute_gae(&segment, self.config.gamma, self.config.lam)?;
            let summary = self.update_loop.update(
                &mut self.agent,
                &segment,
                &advantages,
                self.timesteps_so_far,
                total_timesteps,
            )?;

            self.timesteps_so_far += segment.total_timestep;
            self.iterations += 1;
            self.episodes_so_far += segment.n_episodes();
            for (&ret, &len) in segment.ep_rets.iter().zip(&segment.ep_lens) {
                self.push_episode(ret, len);
            }

            stats = self.snapshot(segment.n_episodes(), Some(&summary), start);
            log::info!(
                "iter {} | timesteps {}/{} | episodes {} | mean return {} | mean len {} | lr {:.3e} | explained var {}",
                stats.iterations,
                stats.timesteps,
                total_timesteps,
                stats.episodes,
                fmt_opt(stats.mean_episode_return),
                fmt_opt(stats.mean_episode_length),
                stats.learning_rate,
                fmt_opt(stats.explained_variance),
            );
            log::debug!("losses: {}", summary.mean_losses);

            if !callback(&stats) {
                log::info!("Training stopped by callback after {} iterations", stats.iterations);
                break;
            }
        }

        Ok(stats)
    }

    fn push_episode(&mut self, ret: f32, len: usize) {
        if self.recent_returns.len() == self.config.episode_window {
            self.recent_returns.pop_front();
            self.recent_lengths.pop_front();
        }
        self.recent_returns.push_back(ret);
        self.recent_lengths.push_back(len);
    }

    fn snapshot(
        &self,
        episodes_this_iter: usize,
        summary: Option<&UpdateSummary>,
        start: Instant,
    ) -> TrainingStats {
        let n = self.recent_returns.len();
        let (mean_episode_return, mean_episode_length) = if n == 0 {
            (None, None)
        } else {
            (
                Some(self.recent_returns.iter().sum::<f32>() / n as f32),
                Some(self.recent_lengths.iter().sum::<usize>() as f32 / n as f32),
            )
        };
        TrainingStats {
            iterations: self.iterations,
            timesteps: self.timesteps_so_far,
            episodes: self.episodes_so_far,
            episodes_this_iter,
            mean_episode_return,
            mean_episode_length,
            lr_mult: summary.map_or(0.0, |s| s.lr_mult),
            learning_rate: summary.map_or(0.0, |s| s.context.learning_rate),
            last_losses: summary.map(|s| s.mean_losses.clone()),
            explained_variance: summary.and_then(|s| s.explained_variance()),
            time_elapsed: start.elapsed().as_secs_f32(),
        }
    }
}

fn fmt_opt(v: Option<f32>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
}
