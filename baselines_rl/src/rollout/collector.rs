//! Segment-at-a-time rollout collection.
//!
//! The collector is an explicit state machine: it holds the running
//! observation, episode accumulators and step counters between calls and
//! suspends only at segment boundaries.
//!
//! # Boundary Protocol
//!
//! ```text
//! step:      0   1   2   3 | 4   5   6   7 | 8
//! segment:   [---- k=0 ----] [---- k=1 ----]
//!                          ^
//!            query V(s_4), emit segment 0 with
//!            next_value = V(s_4) * (1 - episode_start_4)
//!            ... caller may update the policy ...
//!            re-query (a_4, V(s_4)), then step
//! ```
//!
//! The policy is borrowed per call so the consumer can update its parameters
//! between segments.

use crate::environment::Environment;
use crate::error::{Result, RlError};
use crate::policy::Policy;

use super::segment::Segment;

/// Collects fixed-length segments by stepping a policy against an environment.
pub struct RolloutCollector<E> {
    env: E,
    n_samples: usize,
    obs_dim: usize,
    act_dim: usize,

    /// Segment being filled; cloned out at each boundary
    current: Segment,
    observation: Vec<f32>,
    episode_start: bool,

    cur_ep_ret: f32,
    cur_ep_true_ret: f32,
    cur_ep_len: usize,

    /// Total steps since construction
    step: usize,
    /// Steps since the last emitted segment
    current_it_len: usize,
    awaiting_resume: bool,
}

impl<E: Environment> RolloutCollector<E> {
    /// Create a collector. Resets the environment.
    pub fn new(mut env: E, n_samples: usize) -> Result<Self> {
        if n_samples == 0 {
            return Err(RlError::InvalidConfig {
                param: "n_samples",
                message: "must be > 0".into(),
            });
        }
        let obs_dim = env.observation_space().dim();
        let act_dim = env.action_space().dim();
        let observation = env.reset()?;
        if observation.len() != obs_dim {
            return Err(RlError::shape("reset observation", obs_dim, observation.len()));
        }

        Ok(Self {
            env,
            n_samples,
            obs_dim,
            act_dim,
            current: Segment::zeroed(n_samples, obs_dim, act_dim),
            observation,
            episode_start: true,
            cur_ep_ret: 0.0,
            cur_ep_true_ret: 0.0,
            cur_ep_len: 0,
            step: 0,
            current_it_len: 0,
            awaiting_resume: false,
        })
    }

    /// Steps per segment.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Total environment steps taken.
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// Get a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Consume the collector and return the environment.
    pub fn into_env(self) -> E {
        self.env
    }

    /// Run until the next segment boundary and return the completed segment.
    ///
    /// Policy and environment errors propagate unchanged. After an error the
    /// collector should be discarded.
    pub fn next_segment<P: Policy + ?Sized>(&mut self, policy: &mut P) -> Result<Segment> {
        if self.awaiting_resume {
            // parameters may have changed since the boundary query
            let (action, value) = self.query(policy)?;
            self.awaiting_resume = false;
            self.current.clear_episode_summaries();
            self.current_it_len = 0;
            self.take_step(action, value)?;
        }

        loop {
            let (action, value) = self.query(policy)?;
            if self.step > 0 && self.step % self.n_samples == 0 {
                let next_value = if self.episode_start { 0.0 } else { value };
                self.awaiting_resume = true;
                return Ok(self.emit(next_value));
            }
            self.take_step(action, value)?;
        }
    }

    /// Iterator over segments for a policy that stays fixed while iterating.
    ///
    /// Stops after yielding the first error.
    pub fn segments<'a, P: Policy + ?Sized>(&'a mut self, policy: &'a mut P) -> Segments<'a, E, P> {
        Segments {
            collector: self,
            policy,
            failed: false,
        }
    }

    fn query<P: Policy + ?Sized>(&self, policy: &mut P) -> Result<(Vec<f32>, f32)> {
        let out = policy.step(&self.observation, 1)?;
        if out.actions.len() != self.act_dim {
            return Err(RlError::shape("policy actions", self.act_dim, out.actions.len()));
        }
        if out.values.len() != 1 {
            return Err(RlError::shape("policy values", 1, out.values.len()));
        }
        Ok((out.actions, out.values[0]))
    }

    fn take_step(&mut self, action: Vec<f32>, value: f32) -> Result<()> {
        let i = self.step % self.n_samples;
        let (obs_dim, act_dim) = (self.obs_dim, self.act_dim);

        let seg = &mut self.current;
        seg.observations[i * obs_dim..(i + 1) * obs_dim].copy_from_slice(&self.observation);
        seg.vpreds[i] = value;
        seg.actions[i * act_dim..(i + 1) * act_dim].copy_from_slice(&action);
        seg.episode_starts[i] = self.episode_start;

        let clipped = self.env.action_space().clip(&action);
        let result = self.env.step(&clipped)?;
        let true_reward = result.info.true_reward.unwrap_or(result.reward);

        seg.rewards[i] = result.reward;
        seg.true_rewards[i] = true_reward;
        seg.dones[i] = result.done;
        self.episode_start = result.done;

        self.cur_ep_ret += result.reward;
        self.cur_ep_true_ret += true_reward;
        self.cur_ep_len += 1;
        self.current_it_len += 1;

        if result.done {
            if let Some(episode) = result.info.episode {
                self.cur_ep_ret = episode.ret;
                self.cur_ep_true_ret = episode.ret;
            }
            seg.ep_rets.push(self.cur_ep_ret);
            seg.ep_true_rets.push(self.cur_ep_true_ret);
            seg.ep_lens.push(self.cur_ep_len);
            self.cur_ep_ret = 0.0;
            self.cur_ep_true_ret = 0.0;
            self.cur_ep_len = 0;
            self.observation = self.env.reset()?;
        } else {
            self.observation = result.observation;
        }
        if self.observation.len() != obs_dim {
            return Err(RlError::shape("environment observation", obs_dim, self.observation.len()));
        }

        self.step += 1;
        Ok(())
    }

    fn emit(&mut self, next_value: f32) -> Segment {
        self.current.next_value = next_value;
        self.current.total_timestep = self.current_it_len;
        log::debug!(
            "Segment complete at step {}: {} episodes, next_value={:.4}",
            self.step,
            self.current.n_episodes(),
            next_value
        );
        self.current.clone()
    }
}

/// Iterator returned by [`RolloutCollector::segments`].
pub struct Segments<'a, E, P: ?Sized> {
    collector: &'a mut RolloutCollector<E>,
    policy: &'a mut P,
    failed: bool,
}

impl<'a, E: Environment, P: Policy + ?Sized> Iterator for Segments<'a, E, P> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.collector.next_segment(&mut *self.policy);
        self.failed = next.is_err();
        Some(next)
    }
}
