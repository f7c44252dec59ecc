//! Fixed-capacity transition replay buffer for off-policy algorithms.
//!
//! Key characteristics:
//! - Storage allocated once (zero-filled) and overwritten in place (FIFO)
//! - Uniform sampling with replacement over the `size` valid slots only
//! - Structure-of-arrays layout: five flat `f32` arrays indexed by slot
//! - Snapshot persistence addressed by a caller-supplied path prefix
//!
//! # Index Invariants
//!
//! ```text
//! capacity = 4, after 6 inserts (T0..T5):
//!
//!   slot:    0    1    2    3
//!          [T4] [T5] [T2] [T3]
//!                ^    ^
//!     last_written    write_cursor
//!
//!   size = min(6, 4) = 4
//! ```
//!
//! `write_cursor` advances modulo `capacity` on every insert; `size` saturates
//! at `capacity`. Before the first wraparound slots `>= size` hold zeros and
//! are never sampled.
//!
//! # Thread Safety
//!
//! The buffer has no internal locking. Use
//! [`SharedReplayBuffer`](super::shared::SharedReplayBuffer) when several
//! threads insert or sample.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RlError};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the replay buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayBufferConfig {
    /// Maximum number of stored transitions
    pub capacity: usize,
    /// Default number of transitions returned by [`ReplayBuffer::sample_default`]
    pub batch_size: usize,
    /// Observation dimension
    pub obs_dim: usize,
    /// Action dimension
    pub act_dim: usize,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 200_000,
            batch_size: 128,
            obs_dim: 1,
            act_dim: 1,
        }
    }
}

impl ReplayBufferConfig {
    /// Create a config with the given dimensions and default sizes.
    pub fn new(obs_dim: usize, act_dim: usize) -> Self {
        Self {
            obs_dim,
            act_dim,
            ..Default::default()
        }
    }

    /// Set the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the default batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(RlError::InvalidConfig {
                param: "capacity",
                message: "must be > 0".into(),
            });
        }
        if self.obs_dim == 0 {
            return Err(RlError::InvalidConfig {
                param: "obs_dim",
                message: "must be > 0".into(),
            });
        }
        if self.act_dim == 0 {
            return Err(RlError::InvalidConfig {
                param: "act_dim",
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Batch / views
// ============================================================================

/// Uniformly sampled transitions, five parallel arrays.
///
/// Row `i` of every array comes from the same stored transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayBatch {
    /// Flattened observations: [batch * obs_dim]
    pub observations: Vec<f32>,
    /// Flattened actions: [batch * act_dim]
    pub actions: Vec<f32>,
    /// Rewards: [batch]
    pub rewards: Vec<f32>,
    /// Flattened next observations: [batch * obs_dim]
    pub next_observations: Vec<f32>,
    /// Done flags as 0.0 / 1.0: [batch]
    pub dones: Vec<f32>,
    /// Slot indices the rows were gathered from: [batch]
    pub indices: Vec<usize>,
    /// Observation dimension
    pub obs_dim: usize,
    /// Action dimension
    pub act_dim: usize,
}

impl ReplayBatch {
    /// Number of sampled transitions.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Observation of row `i`.
    pub fn observation(&self, i: usize) -> &[f32] {
        &self.observations[i * self.obs_dim..(i + 1) * self.obs_dim]
    }

    /// Action of row `i`.
    pub fn action(&self, i: usize) -> &[f32] {
        &self.actions[i * self.act_dim..(i + 1) * self.act_dim]
    }

    /// Next observation of row `i`.
    pub fn next_observation(&self, i: usize) -> &[f32] {
        &self.next_observations[i * self.obs_dim..(i + 1) * self.obs_dim]
    }
}

/// Borrowed view of one stored transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRef<'a> {
    pub observation: &'a [f32],
    pub action: &'a [f32],
    pub reward: f32,
    pub next_observation: &'a [f32],
    pub done: f32,
}

// ============================================================================
// Snapshot record
// ============================================================================

/// Scalar state written next to the storage arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SnapshotConfig {
    capacity: usize,
    size: usize,
    write_cursor: usize,
    last_written: usize,
    batch_size: usize,
    obs_dim: usize,
    act_dim: usize,
}

const OBS_SUFFIX: &str = ".obs_t.bin";
const ACTION_SUFFIX: &str = ".action_t.bin";
const REWARD_SUFFIX: &str = ".reward.bin";
const NEXT_OBS_SUFFIX: &str = ".obs_tp1.bin";
const DONE_SUFFIX: &str = ".done.bin";
const CONFIG_SUFFIX: &str = ".config.json";

/// All files belonging to a snapshot prefix.
pub fn snapshot_files(prefix: &Path) -> [PathBuf; 6] {
    [
        with_suffix(prefix, OBS_SUFFIX),
        with_suffix(prefix, ACTION_SUFFIX),
        with_suffix(prefix, REWARD_SUFFIX),
        with_suffix(prefix, NEXT_OBS_SUFFIX),
        with_suffix(prefix, DONE_SUFFIX),
        with_suffix(prefix, CONFIG_SUFFIX),
    ]
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

fn write_f32_file(path: &Path, data: &[f32]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for v in data {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn read_f32_file(path: &Path, expected_len: usize) -> Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    if bytes.len() != expected_len * 4 {
        return Err(RlError::Corrupt(format!(
            "{} holds {} bytes, expected {}",
            path.display(),
            bytes.len(),
            expected_len * 4
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

// ============================================================================
// ReplayBuffer
// ============================================================================

/// Fixed-capacity circular store of transitions.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    config: ReplayBufferConfig,
    /// Observations: [capacity * obs_dim]
    obs_t: Vec<f32>,
    /// Actions: [capacity * act_dim]
    action_t: Vec<f32>,
    /// Rewards: [capacity]
    reward: Vec<f32>,
    /// Next observations: [capacity * obs_dim]
    obs_tp1: Vec<f32>,
    /// Done flags: [capacity]
    done: Vec<f32>,
    size: usize,
    write_cursor: usize,
    last_written: usize,
}

impl ReplayBuffer {
    /// Create a zero-filled buffer.
    pub fn new(config: ReplayBufferConfig) -> Result<Self> {
        config.validate()?;
        let ReplayBufferConfig {
            capacity,
            obs_dim,
            act_dim,
            ..
        } = config;
        Ok(Self {
            obs_t: vec![0.0; capacity * obs_dim],
            action_t: vec![0.0; capacity * act_dim],
            reward: vec![0.0; capacity],
            obs_tp1: vec![0.0; capacity * obs_dim],
            done: vec![0.0; capacity],
            size: 0,
            write_cursor: 0,
            last_written: 0,
            config,
        })
    }

    /// Convenience constructor mirroring the config fields.
    pub fn with_dims(capacity: usize, batch_size: usize, obs_dim: usize, act_dim: usize) -> Result<Self> {
        Self::new(
            ReplayBufferConfig::new(obs_dim, act_dim)
                .with_capacity(capacity)
                .with_batch_size(batch_size),
        )
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReplayBufferConfig {
        &self.config
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Default sample size.
    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    /// Number of valid transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if no transition has been stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Check whether every slot holds a transition.
    pub fn is_full(&self) -> bool {
        self.size == self.config.capacity
    }

    /// Check whether `batch_size` transitions are stored.
    pub fn can_sample(&self, batch_size: usize) -> bool {
        self.size >= batch_size
    }

    /// Slot the next insert writes to.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Slot of the most recent insert.
    pub fn last_written(&self) -> usize {
        self.last_written
    }

    /// Fraction of capacity in use (0.0 to 1.0).
    pub fn utilization(&self) -> f32 {
        self.size as f32 / self.config.capacity as f32
    }

    /// Store a transition, overwriting the oldest slot once full.
    ///
    /// Shapes are validated before any slot is touched.
    pub fn insert(
        &mut self,
        obs: &[f32],
        action: &[f32],
        reward: f32,
        next_obs: &[f32],
        done: bool,
    ) -> Result<()> {
        let obs_dim = self.config.obs_dim;
        let act_dim = self.config.act_dim;
        if obs.len() != obs_dim {
            return Err(RlError::shape("observation", obs_dim, obs.len()));
        }
        if action.len() != act_dim {
            return Err(RlError::shape("action", act_dim, action.len()));
        }
        if next_obs.len() != obs_dim {
            return Err(RlError::shape("next observation", obs_dim, next_obs.len()));
        }

        let idx = self.write_cursor;
        self.obs_t[idx * obs_dim..(idx + 1) * obs_dim].copy_from_slice(obs);
        self.action_t[idx * act_dim..(idx + 1) * act_dim].copy_from_slice(action);
        self.reward[idx] = reward;
        self.obs_tp1[idx * obs_dim..(idx + 1) * obs_dim].copy_from_slice(next_obs);
        self.done[idx] = if done { 1.0 } else { 0.0 };

        self.last_written = idx;
        self.write_cursor = (idx + 1) % self.config.capacity;
        self.size = (self.size + 1).min(self.config.capacity);
        Ok(())
    }

    /// Read one stored transition. Returns `None` for slots `>= len()`.
    pub fn transition(&self, idx: usize) -> Option<TransitionRef<'_>> {
        if idx >= self.size {
            return None;
        }
        let obs_dim = self.config.obs_dim;
        let act_dim = self.config.act_dim;
        Some(TransitionRef {
            observation: &self.obs_t[idx * obs_dim..(idx + 1) * obs_dim],
            action: &self.action_t[idx * act_dim..(idx + 1) * act_dim],
            reward: self.reward[idx],
            next_observation: &self.obs_tp1[idx * obs_dim..(idx + 1) * obs_dim],
            done: self.done[idx],
        })
    }

    /// The most recently inserted transition.
    pub fn latest(&self) -> Option<TransitionRef<'_>> {
        self.transition(self.last_written)
    }

    /// Sample `batch_size` transitions uniformly with replacement.
    pub fn sample(&self, batch_size: usize) -> Result<ReplayBatch> {
        self.sample_with_rng(batch_size, &mut rand::thread_rng())
    }

    /// Sample the configured default batch size.
    pub fn sample_default(&self) -> Result<ReplayBatch> {
        self.sample(self.config.batch_size)
    }

    /// Sample with a caller-provided RNG.
    pub fn sample_with_rng<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<ReplayBatch> {
        if self.size == 0 {
            return Err(RlError::InsufficientData {
                requested: batch_size,
                available: 0,
            });
        }
        let indices: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..self.size)).collect();
        Ok(self.gather(indices))
    }

    fn gather(&self, indices: Vec<usize>) -> ReplayBatch {
        let obs_dim = self.config.obs_dim;
        let act_dim = self.config.act_dim;
        let n = indices.len();

        let mut batch = ReplayBatch {
            observations: Vec::with_capacity(n * obs_dim),
            actions: Vec::with_capacity(n * act_dim),
            rewards: Vec::with_capacity(n),
            next_observations: Vec::with_capacity(n * obs_dim),
            dones: Vec::with_capacity(n),
            indices: Vec::new(),
            obs_dim,
            act_dim,
        };
        for &idx in &indices {
            batch.observations.extend_from_slice(&self.obs_t[idx * obs_dim..(idx + 1) * obs_dim]);
            batch.actions.extend_from_slice(&self.action_t[idx * act_dim..(idx + 1) * act_dim]);
            batch.rewards.push(self.reward[idx]);
            batch.next_observations.extend_from_slice(&self.obs_tp1[idx * obs_dim..(idx + 1) * obs_dim]);
            batch.dones.push(self.done[idx]);
        }
        batch.indices = indices;
        batch
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Save storage arrays and scalar state under `prefix`.
    ///
    /// Writes `<prefix>.obs_t.bin`, `<prefix>.action_t.bin`,
    /// `<prefix>.reward.bin`, `<prefix>.obs_tp1.bin`, `<prefix>.done.bin`
    /// (little-endian f32) and `<prefix>.config.json`.
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<()> {
        let prefix = prefix.as_ref();
        if let Some(parent) = prefix.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let [obs, action, reward, next_obs, done, config] = snapshot_files(prefix);
        write_f32_file(&obs, &self.obs_t)?;
        write_f32_file(&action, &self.action_t)?;
        write_f32_file(&reward, &self.reward)?;
        write_f32_file(&next_obs, &self.obs_tp1)?;
        write_f32_file(&done, &self.done)?;

        let record = SnapshotConfig {
            capacity: self.config.capacity,
            size: self.size,
            write_cursor: self.write_cursor,
            last_written: self.last_written,
            batch_size: self.config.batch_size,
            obs_dim: self.config.obs_dim,
            act_dim: self.config.act_dim,
        };
        fs::write(&config, serde_json::to_string_pretty(&record)?)?;

        log::debug!(
            "Saved replay buffer snapshot {} (size={}, cursor={})",
            prefix.display(),
            self.size,
            self.write_cursor
        );
        Ok(())
    }

    /// Restore a snapshot into this buffer.
    ///
    /// The snapshot must have the same capacity and dimensions. The default
    /// batch size is taken from the snapshot. On error the buffer is unchanged.
    pub fn load(&mut self, prefix: impl AsRef<Path>) -> Result<()> {
        let prefix = prefix.as_ref();
        let record = read_snapshot_config(prefix)?;
        if record.capacity != self.config.capacity {
            return Err(RlError::shape("snapshot capacity", self.config.capacity, record.capacity));
        }
        if record.obs_dim != self.config.obs_dim {
            return Err(RlError::shape("snapshot obs_dim", self.config.obs_dim, record.obs_dim));
        }
        if record.act_dim != self.config.act_dim {
            return Err(RlError::shape("snapshot act_dim", self.config.act_dim, record.act_dim));
        }
        *self = Self::read_snapshot(prefix, record)?;
        Ok(())
    }

    /// Build a buffer directly from a snapshot on disk.
    pub fn from_snapshot(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        let record = read_snapshot_config(prefix)?;
        Self::read_snapshot(prefix, record)
    }

    fn read_snapshot(prefix: &Path, record: SnapshotConfig) -> Result<Self> {
        let config = ReplayBufferConfig {
            capacity: record.capacity,
            batch_size: record.batch_size,
            obs_dim: record.obs_dim,
            act_dim: record.act_dim,
        };
        config
            .validate()
            .map_err(|e| RlError::Corrupt(format!("invalid snapshot config: {}", e)))?;
        if record.size > record.capacity
            || record.write_cursor >= record.capacity
            || record.last_written >= record.capacity
        {
            return Err(RlError::Corrupt(format!(
                "indices out of range: size={}, write_cursor={}, last_written={}, capacity={}",
                record.size, record.write_cursor, record.last_written, record.capacity
            )));
        }

        let [obs, action, reward, next_obs, done, _] = snapshot_files(prefix);
        let capacity = config.capacity;
        let buffer = Self {
            obs_t: read_f32_file(&obs, capacity * config.obs_dim)?,
            action_t: read_f32_file(&action, capacity * config.act_dim)?,
            reward: read_f32_file(&reward, capacity)?,
            obs_tp1: read_f32_file(&next_obs, capacity * config.obs_dim)?,
            done: read_f32_file(&done, capacity)?,
            size: record.size,
            write_cursor: record.write_cursor,
            last_written: record.last_written,
            config,
        };

        log::debug!(
            "Loaded replay buffer snapshot {} (size={}, cursor={})",
            prefix.display(),
            buffer.size,
            buffer.write_cursor
        );
        Ok(buffer)
    }
}

fn read_snapshot_config(prefix: &Path) -> Result<SnapshotConfig> {
    let path = with_suffix(prefix, CONFIG_SUFFIX);
    let text = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(ReplayBufferConfig::new(3, 1).validate().is_ok());
        assert!(ReplayBufferConfig::new(0, 1).validate().is_err());
        assert!(ReplayBufferConfig::new(3, 0).validate().is_err());
        assert!(ReplayBufferConfig::new(3, 1).with_capacity(0).validate().is_err());
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = ReplayBuffer::with_dims(10, 4, 2, 1).unwrap();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
        assert!(!buffer.can_sample(1));
        assert!(buffer.can_sample(0));
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_suffixed_paths() {
        let files = snapshot_files(Path::new("/tmp/run/replay"));
        assert_eq!(files[0], PathBuf::from("/tmp/run/replay.obs_t.bin"));
        assert_eq!(files[5], PathBuf::from("/tmp/run/replay.config.json"));
    }
}
