//! Test suite for rollout collection.
//!
//! Test categories:
//! 1. Segment boundaries and value bootstrapping
//! 2. Episode summaries (alignment, monitor override, true reward)
//! 3. Chronology across segments and policy re-query after a boundary
//! 4. Action clipping
//! 5. Error propagation

use super::*;
use crate::environment::{EnvStep, Environment, EpisodeInfo, EpisodeMonitor, Space};
use crate::error::{Result, RlError};
use crate::policy::{Policy, PolicyOutput};

// =============================================================================
// HELPERS
// =============================================================================

/// Environment whose observation is the global step count.
///
/// Episode lengths cycle through `horizons`; reward 1 per step.
struct ScriptedEnv {
    horizons: Vec<usize>,
    episode: usize,
    t_in_episode: usize,
    global_t: usize,
    obs_space: Space,
    act_space: Space,
    received_actions: Vec<Vec<f32>>,
    fail_at: Option<usize>,
    true_reward: Option<f32>,
    episode_override: Option<f32>,
}

impl ScriptedEnv {
    fn new(horizons: Vec<usize>) -> Self {
        Self {
            horizons,
            episode: 0,
            t_in_episode: 0,
            global_t: 0,
            obs_space: Space::uniform_box(1, 0.0, 1e6),
            act_space: Space::Discrete(2),
            received_actions: Vec::new(),
            fail_at: None,
            true_reward: None,
            episode_override: None,
        }
    }

    fn with_action_space(mut self, space: Space) -> Self {
        self.act_space = space;
        self
    }
}

impl Environment for ScriptedEnv {
    fn reset(&mut self) -> Result<Vec<f32>> {
        self.t_in_episode = 0;
        Ok(vec![self.global_t as f32])
    }

    fn step(&mut self, action: &[f32]) -> Result<EnvStep> {
        if self.fail_at == Some(self.global_t) {
            return Err(RlError::Environment(format!("simulator crashed at {}", self.global_t)));
        }
        self.received_actions.push(action.to_vec());
        self.global_t += 1;
        self.t_in_episode += 1;

        let horizon = self.horizons[self.episode % self.horizons.len()];
        let done = self.t_in_episode == horizon;
        if done {
            self.episode += 1;
        }

        let mut step = EnvStep::new(vec![self.global_t as f32], 1.0, done);
        step.info.true_reward = self.true_reward;
        if done {
            step.info.episode = self.episode_override.map(|ret| EpisodeInfo { ret, len: horizon });
        }
        Ok(step)
    }

    fn observation_space(&self) -> &Space {
        &self.obs_space
    }

    fn action_space(&self) -> &Space {
        &self.act_space
    }
}

/// Deterministic policy: action = [bias + 0.5], value = 2 * obs + 1 + bias.
struct ScriptedPolicy {
    bias: f32,
    calls: usize,
    act_dim: usize,
}

impl ScriptedPolicy {
    fn new() -> Self {
        Self {
            bias: 0.0,
            calls: 0,
            act_dim: 1,
        }
    }

    fn value_of(&self, obs: f32) -> f32 {
        2.0 * obs + 1.0 + self.bias
    }
}

impl Policy for ScriptedPolicy {
    fn step(&mut self, observations: &[f32], n_obs: usize) -> Result<PolicyOutput> {
        assert_eq!(n_obs, 1);
        self.calls += 1;
        Ok(PolicyOutput::new(
            vec![self.bias + 0.5; self.act_dim],
            vec![self.value_of(observations[0])],
        ))
    }
}

// =============================================================================
// 1. BOUNDARIES
// =============================================================================

#[test]
fn should_emit_full_segment_after_n_steps_and_one_query() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![2]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();

    assert_eq!(seg.len(), 4);
    assert_eq!(seg.observations, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(seg.vpreds, vec![1.0, 3.0, 5.0, 7.0]);
    assert_eq!(seg.total_timestep, 4);
    assert_eq!(collector.steps_taken(), 4);
    assert_eq!(policy.calls, 5);
}

#[test]
fn should_zero_next_value_when_next_step_starts_episode() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![2]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.dones, vec![false, true, false, true]);
    assert_eq!(seg.next_value, 0.0);
}

#[test]
fn should_bootstrap_next_value_mid_episode() {
    // episodes of length 3: step 4 is mid-episode
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![3]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.next_value, policy.value_of(4.0));
}

#[test]
fn should_reject_zero_n_samples() {
    assert!(matches!(
        RolloutCollector::new(ScriptedEnv::new(vec![2]), 0),
        Err(RlError::InvalidConfig { param: "n_samples", .. })
    ));
}

// =============================================================================
// 2. EPISODE SUMMARIES
// =============================================================================

#[test]
fn should_record_two_episodes_when_aligned() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![2]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.episode_starts, vec![true, false, true, false]);
    assert_eq!(seg.ep_rets, vec![2.0, 2.0]);
    assert_eq!(seg.ep_true_rets, vec![2.0, 2.0]);
    assert_eq!(seg.ep_lens, vec![2, 2]);
}

#[test]
fn should_record_one_full_episode_when_offset() {
    // first episode lasts one step, then length-2 episodes
    let mut env = ScriptedEnv::new(vec![2]);
    env.horizons = vec![1, 2, 2, 2];
    let mut collector = RolloutCollector::new(env, 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.dones, vec![true, false, true, false]);
    assert_eq!(seg.ep_lens, vec![1, 2]);
    assert_eq!(seg.ep_rets, vec![1.0, 2.0]);
    assert_eq!(seg.ep_lens.iter().filter(|&&l| l == 2).count(), 1);
    // step 4 continues the episode started at step 3
    assert_eq!(seg.next_value, policy.value_of(4.0));
}

#[test]
fn should_carry_partial_episode_into_next_segment() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![6]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let first = collector.next_segment(&mut policy).unwrap();
    assert!(first.ep_lens.is_empty());

    let second = collector.next_segment(&mut policy).unwrap();
    assert_eq!(second.ep_lens, vec![6]);
    assert_eq!(second.ep_rets, vec![6.0]);
}

#[test]
fn should_clear_summaries_between_segments() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![2]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let first = collector.next_segment(&mut policy).unwrap();
    let second = collector.next_segment(&mut policy).unwrap();
    assert_eq!(first.ep_lens.len(), 2);
    assert_eq!(second.ep_lens.len(), 2);
    assert_eq!(second.total_timestep, 4);
}

#[test]
fn should_prefer_monitor_episode_return() {
    let mut env = ScriptedEnv::new(vec![2]);
    env.episode_override = Some(10.0);
    env.true_reward = Some(0.25);
    let mut collector = RolloutCollector::new(env, 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.rewards, vec![1.0; 4]);
    assert_eq!(seg.true_rewards, vec![0.25; 4]);
    assert_eq!(seg.ep_rets, vec![10.0, 10.0]);
    assert_eq!(seg.ep_true_rets, vec![10.0, 10.0]);
}

#[test]
fn should_accumulate_true_reward_without_monitor() {
    let mut env = ScriptedEnv::new(vec![2]);
    env.true_reward = Some(0.25);
    let mut collector = RolloutCollector::new(env, 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.ep_rets, vec![2.0, 2.0]);
    assert_eq!(seg.ep_true_rets, vec![0.5, 0.5]);
}

#[test]
fn should_agree_with_episode_monitor() {
    let env = EpisodeMonitor::new(ScriptedEnv::new(vec![3, 1]));
    let mut collector = RolloutCollector::new(env, 8).unwrap();
    let mut policy = ScriptedPolicy::new();

    let seg = collector.next_segment(&mut policy).unwrap();
    let monitor = collector.env();
    assert_eq!(seg.ep_rets, monitor.episode_returns());
    assert_eq!(seg.ep_lens, monitor.episode_lengths());
    assert_eq!(monitor.total_steps(), 8);
}

// =============================================================================
// 3. CHRONOLOGY / RE-QUERY
// =============================================================================

#[test]
fn should_keep_segments_in_chronological_order() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![3]), 5).unwrap();
    let mut policy = ScriptedPolicy::new();

    let segments: Vec<Segment> = collector
        .segments(&mut policy)
        .take(3)
        .collect::<Result<_>>()
        .unwrap();

    for (k, seg) in segments.iter().enumerate() {
        let expected: Vec<f32> = (k * 5..(k + 1) * 5).map(|t| t as f32).collect();
        assert_eq!(seg.observations, expected);
    }
    assert_eq!(policy.calls, 18);
}

#[test]
fn should_requery_policy_after_update_between_segments() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![10]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let first = collector.next_segment(&mut policy).unwrap();
    assert_eq!(first.next_value, policy.value_of(4.0));

    policy.bias = 100.0;
    let second = collector.next_segment(&mut policy).unwrap();

    assert_eq!(second.observation(0), &[4.0]);
    assert_eq!(second.vpreds[0], policy.value_of(4.0));
    assert_eq!(second.action(0), &[100.5]);
    assert_eq!(collector.env().received_actions[4], vec![100.5]);
}

// =============================================================================
// 4. CLIPPING
// =============================================================================

#[test]
fn should_clip_box_actions_but_record_raw_action() {
    let env = ScriptedEnv::new(vec![4]).with_action_space(Space::uniform_box(2, -0.25, 0.25));
    let mut collector = RolloutCollector::new(env, 2).unwrap();
    let mut policy = ScriptedPolicy::new();
    policy.act_dim = 2;

    let seg = collector.next_segment(&mut policy).unwrap();
    assert_eq!(seg.actions, vec![0.5; 4]);
    assert!(collector.env().received_actions.iter().all(|a| a == &vec![0.25, 0.25]));
}

// =============================================================================
// 5. ERRORS
// =============================================================================

#[test]
fn should_reject_policy_action_shape_mismatch() {
    let mut collector = RolloutCollector::new(ScriptedEnv::new(vec![2]), 4).unwrap();
    let mut policy = ScriptedPolicy::new();
    policy.act_dim = 3;

    let err = collector.next_segment(&mut policy).unwrap_err();
    assert!(matches!(err, RlError::Shape { what: "policy actions", expected: 1, actual: 3 }));
}

#[test]
fn should_propagate_environment_failure() {
    let mut env = ScriptedEnv::new(vec![2]);
    env.fail_at = Some(2);
    let mut collector = RolloutCollector::new(env, 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let err = collector.next_segment(&mut policy).unwrap_err();
    assert!(matches!(err, RlError::Environment(_)));
}

#[test]
fn should_stop_iterating_after_error() {
    let mut env = ScriptedEnv::new(vec![2]);
    env.fail_at = Some(5);
    let mut collector = RolloutCollector::new(env, 4).unwrap();
    let mut policy = ScriptedPolicy::new();

    let results: Vec<_> = collector.segments(&mut policy).take(5).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}
