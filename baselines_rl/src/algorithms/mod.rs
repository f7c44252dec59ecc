//! Algorithm components.
//!
//! - `gae`: Generalized Advantage Estimation over segments
//! - `ppo`: PPO update loop and trainer

pub mod gae;
pub mod ppo;

#[cfg(test)]
mod tests;

pub use gae::{compute_gae, normalize_advantages, Advantages};
