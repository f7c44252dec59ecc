//! Replay buffer checkpointing module.
//!
//! ## Features
//!
//! - Snapshot saving at configurable step intervals
//! - Automatic cleanup of old snapshots
//! - Resume from the latest snapshot
//!
//! ## Example
//!
//! ```rust,no_run
//! use baselines_rl::buffers::ReplayBuffer;
//! use baselines_rl::checkpoint::{Checkpointer, CheckpointerConfig};
//!
//! # fn main() -> baselines_rl::Result<()> {
//! let config = CheckpointerConfig::new("./checkpoints")
//!     .with_save_interval(10_000)
//!     .with_keep_last_n(5);
//! let checkpointer = Checkpointer::new(config)?;
//! let mut buffer = ReplayBuffer::with_dims(200_000, 128, 4, 1)?;
//!
//! // Resume if a snapshot exists
//! let start_step = checkpointer.load_latest(&mut buffer).unwrap_or(0);
//!
//! for step in start_step + 1..=start_step + 20_000 {
//!     // ... insert transitions ...
//!     if checkpointer.should_save(step) {
//!         checkpointer.save(&buffer, step)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;

pub use checkpointer::{CheckpointInfo, Checkpointer, CheckpointerConfig};
