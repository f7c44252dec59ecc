//! On-policy rollout collection.
//!
//! - `Segment`: fixed-length slice of trajectory data plus episode summaries
//! - `RolloutCollector`: state machine producing segments with correct value
//!   bootstrapping at segment boundaries

pub mod collector;
pub mod segment;

pub use collector::{RolloutCollector, Segments};
pub use segment::Segment;

#[cfg(test)]
mod tests;
