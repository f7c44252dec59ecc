//! Thread-safe handle around a [`ReplayBuffer`].
//!
//! Inserts take the write lock, samples and queries take the read lock.
//! Cloning the handle shares the same storage.
//!
//! ```text
//! Actor 0 ─┐
//! Actor 1 ─┼──> write() ──> ReplayBuffer <── read() ──> Learner
//! Actor N ─┘
//! ```

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;

use super::replay_buffer::{ReplayBatch, ReplayBuffer, ReplayBufferConfig};
use crate::error::Result;

/// Cloneable, lock-protected replay buffer.
#[derive(Debug, Clone)]
pub struct SharedReplayBuffer {
    inner: Arc<RwLock<ReplayBuffer>>,
}

impl SharedReplayBuffer {
    /// Create a new shared buffer.
    pub fn new(config: ReplayBufferConfig) -> Result<Self> {
        Ok(Self::from_buffer(ReplayBuffer::new(config)?))
    }

    /// Wrap an existing buffer.
    pub fn from_buffer(buffer: ReplayBuffer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buffer)),
        }
    }

    /// Store a transition.
    pub fn insert(
        &self,
        obs: &[f32],
        action: &[f32],
        reward: f32,
        next_obs: &[f32],
        done: bool,
    ) -> Result<()> {
        self.inner.write().insert(obs, action, reward, next_obs, done)
    }

    /// Sample uniformly with replacement.
    pub fn sample(&self, batch_size: usize) -> Result<ReplayBatch> {
        self.inner.read().sample(batch_size)
    }

    /// Sample with a caller-provided RNG.
    pub fn sample_with_rng<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<ReplayBatch> {
        self.inner.read().sample_with_rng(batch_size, rng)
    }

    /// Number of valid transitions.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Check whether `batch_size` transitions are stored.
    pub fn can_sample(&self, batch_size: usize) -> bool {
        self.inner.read().can_sample(batch_size)
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Save a snapshot under `prefix` (holds the read lock while writing).
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<()> {
        self.inner.read().save(prefix)
    }

    /// Restore a snapshot from `prefix`.
    pub fn load(&self, prefix: impl AsRef<Path>) -> Result<()> {
        self.inner.write().load(prefix)
    }

    /// Run a closure with shared access to the buffer.
    pub fn with_read<T>(&self, f: impl FnOnce(&ReplayBuffer) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run a closure with exclusive access to the buffer.
    pub fn with_write<T>(&self, f: impl FnOnce(&mut ReplayBuffer) -> T) -> T {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_inserts() {
        let buffer = SharedReplayBuffer::new(ReplayBufferConfig::new(1, 1).with_capacity(1000)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let v = (t * 100 + i) as f32;
                        buffer.insert(&[v], &[0.0], 1.0, &[v + 1.0], false).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(buffer.len(), 400);
        let batch = buffer.sample(32).unwrap();
        assert_eq!(batch.len(), 32);
        assert!(batch.rewards.iter().all(|&r| r == 1.0));
    }

    #[test]
    fn test_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedReplayBuffer>();
    }
}
