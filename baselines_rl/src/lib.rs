//! # Baselines RL: Replay Storage and Clipped-Surrogate Policy Optimization
//!
//! Building blocks for reinforcement learning training loops that are
//! independent of any particular neural-network framework.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         PPOTrainer                            │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐   Segment   ┌──────────────────────┐    │
//! │  │ RolloutCollector │────────────►│  compute_gae         │    │
//! │  │  env + Policy    │             │  (adv, tdlamret)     │    │
//! │  └──────────────────┘             └──────────┬───────────┘    │
//! │          ▲                                   ▼                │
//! │          │ same agent            ┌──────────────────────┐     │
//! │          └───────────────────────│  PolicyUpdateLoop    │     │
//! │                                  │  UpdateStrategy      │     │
//! │                                  └──────────────────────┘     │
//! └───────────────────────────────────────────────────────────────┘
//!
//!  ReplayBuffer / SharedReplayBuffer ──► Checkpointer (snapshots)
//! ```
//!
//! The model itself is opaque: callers implement [`Policy`] for acting and
//! [`UpdateStrategy`] for loss evaluation and optimizer steps.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use baselines_rl::{PPOConfig, PPOTrainer};
//!
//! let config = PPOConfig::new()
//!     .with_timesteps_per_batch(2048)
//!     .with_schedule("linear");
//!
//! let mut trainer = PPOTrainer::new(config, env, agent)?;
//! let stats = trainer.learn(1_000_000, |stats| {
//!     println!("{}: {:?}", stats.timesteps, stats.mean_episode_return);
//!     true
//! })?;
//! ```

pub mod algorithms;
pub mod buffers;
pub mod checkpoint;
pub mod environment;
pub mod error;
pub mod policy;
pub mod rollout;
pub mod scheduling;

// Re-export commonly used types
pub use error::{Result, RlError};

pub use buffers::{ReplayBatch, ReplayBuffer, ReplayBufferConfig, SharedReplayBuffer, TransitionRef};
pub use checkpoint::{CheckpointInfo, Checkpointer, CheckpointerConfig};

pub use environment::{EnvStep, Environment, EpisodeInfo, EpisodeMonitor, Space, StepInfo};
pub use policy::{LossStats, Minibatch, Policy, PolicyOutput, UpdateContext, UpdateStrategy};
pub use rollout::{RolloutCollector, Segment};

pub use algorithms::gae::{compute_gae, normalize_advantages, Advantages};
pub use algorithms::ppo::{
    explained_variance, PPOConfig, PPOTrainer, PolicyUpdateLoop, SegmentDataset, TrainingStats,
    UpdateSummary,
};
pub use scheduling::{LRScheduler, Schedule, ScheduledLR};
