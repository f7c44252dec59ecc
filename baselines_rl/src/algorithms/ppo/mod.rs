//! Proximal Policy Optimization.
//!
//! - `config`: hyperparameters with builders and validation
//! - `dataset`: shuffled minibatch partitioning of a segment
//! - `update`: the per-segment optimization loop
//! - `runner`: the collect / estimate / update training loop

pub mod config;
pub mod dataset;
pub mod runner;
pub mod update;

pub use config::PPOConfig;
pub use dataset::SegmentDataset;
pub use runner::{PPOTrainer, TrainingStats};
pub use update::{explained_variance, PolicyUpdateLoop, UpdateSummary};
