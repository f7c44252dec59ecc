//! Generalized Advantage Estimation over rollout segments.
//!
//! GAE provides a family of policy gradient estimators parameterized by λ:
//! - λ = 0: one-step TD (low variance, high bias)
//! - λ = 1: Monte Carlo (high variance, low bias)
//!
//! ## Formula
//!
//! A_t = Σ_{l=0}^{∞} (γλ)^l δ_{t+l}
//! where δ_t = r_t + γ V(s_{t+1}) (1 - start_{t+1}) - V(s_t)
//!
//! Episode boundaries are read from the segment's `episode_starts` flags. The
//! bootstrap for the final step is the segment's `next_value`, which the
//! collector has already zeroed when the following state starts an episode.
//!
//! ## References
//!
//! - Schulman et al., "High-Dimensional Continuous Control Using
//!   Generalized Advantage Estimation" (2016)

use crate::error::{Result, RlError};
use crate::rollout::Segment;

/// Advantage estimates and TD(λ) return targets for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Advantages {
    /// Unnormalized advantage estimates [T]
    pub adv: Vec<f32>,
    /// Return targets `adv + vpred` [T]
    pub tdlamret: Vec<f32>,
}

/// Compute GAE for a collected segment using its shaped rewards.
pub fn compute_gae(segment: &Segment, gamma: f32, lam: f32) -> Result<Advantages> {
    let (adv, tdlamret) = compute_gae_from_starts(
        &segment.rewards,
        &segment.vpreds,
        &segment.episode_starts,
        segment.next_value,
        gamma,
        lam,
    )?;
    Ok(Advantages { adv, tdlamret })
}

/// Slice-level GAE with episode-start flags.
///
/// # Arguments
///
/// * `rewards` - rewards received [T]
/// * `values` - value estimates V(s_t) [T]
/// * `episode_starts` - step t begins a new episode [T]
/// * `next_value` - bootstrap V(s_T), zero if s_T starts an episode
///
/// # Returns
///
/// (advantages, returns) - both [T]
///
/// # Errors
///
/// `Shape` when `values` or `episode_starts` differ in length from `rewards`.
pub fn compute_gae_from_starts(
    rewards: &[f32],
    values: &[f32],
    episode_starts: &[bool],
    next_value: f32,
    gamma: f32,
    lam: f32,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let n = rewards.len();
    if values.len() != n {
        return Err(RlError::shape("values", n, values.len()));
    }
    if episode_starts.len() != n {
        return Err(RlError::shape("episode_starts", n, episode_starts.len()));
    }
    let mut advantages = vec![0.0f32; n];
    let mut returns = vec![0.0f32; n];

    let mut last_gae = 0.0f32;
    for t in (0..n).rev() {
        let (nonterminal, v_next) = if t + 1 == n {
            (1.0, next_value)
        } else {
            (if episode_starts[t + 1] { 0.0 } else { 1.0 }, values[t + 1])
        };
        let delta = rewards[t] + gamma * v_next * nonterminal - values[t];
        last_gae = delta + gamma * lam * nonterminal * last_gae;
        advantages[t] = last_gae;
        returns[t] = last_gae + values[t];
    }

    Ok((advantages, returns))
}

/// Standardize advantages to zero mean and unit (population) standard deviation.
///
/// # Errors
///
/// - Empty slice: `Shape`
/// - Zero or non-finite standard deviation: `DegenerateAdvantage`; the slice
///   is left untouched
pub fn normalize_advantages(advantages: &mut [f32]) -> Result<()> {
    if advantages.is_empty() {
        return Err(RlError::shape("advantages", 1, 0));
    }

    let n = advantages.len() as f64;
    let mean = advantages.iter().map(|&a| a as f64).sum::<f64>() / n;
    let variance = advantages.iter().map(|&a| (a as f64 - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if !std.is_finite() || std == 0.0 {
        log::warn!(
            "Degenerate advantage batch (n={}, mean={}, std={}), cannot standardize",
            advantages.len(),
            mean,
            std
        );
        return Err(RlError::DegenerateAdvantage {
            mean: mean as f32,
            std: std as f32,
        });
    }

    for a in advantages.iter_mut() {
        *a = ((*a as f64 - mean) / std) as f32;
    }
    Ok(())
}
