//! Experience storage for off-policy algorithms.
//!
//! - `ReplayBuffer`: fixed-capacity FIFO transition store with uniform sampling
//!   and snapshot persistence
//! - `SharedReplayBuffer`: `Arc<RwLock<_>>` handle for multi-threaded use

pub mod replay_buffer;
pub mod shared;

pub use replay_buffer::{ReplayBatch, ReplayBuffer, ReplayBufferConfig, TransitionRef};
pub use shared::SharedReplayBuffer;
