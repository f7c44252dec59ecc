//! Replay buffer checkpointing.
//!
//! Snapshots are written under `checkpoint_dir` with the prefix
//! `replay_<step:08>`, so lexical and numeric order agree. Each snapshot is
//! the six-file set produced by [`ReplayBuffer::save`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::buffers::replay_buffer::snapshot_files;
use crate::buffers::ReplayBuffer;
use crate::error::{Result, RlError};

const PREFIX: &str = "replay_";
const MARKER_SUFFIX: &str = ".config.json";

/// Configuration for the checkpointer.
#[derive(Debug, Clone)]
pub struct CheckpointerConfig {
    /// Directory to store checkpoints.
    pub checkpoint_dir: PathBuf,
    /// Steps between checkpoint saves.
    pub save_interval: usize,
    /// Number of recent checkpoints to keep (0 = keep all).
    pub keep_last_n: usize,
}

impl Default for CheckpointerConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("./checkpoints"),
            save_interval: 10_000,
            keep_last_n: 5,
        }
    }
}

impl CheckpointerConfig {
    /// Create a new config with specified checkpoint directory.
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            ..Default::default()
        }
    }

    /// Set the save interval.
    pub fn with_save_interval(mut self, interval: usize) -> Self {
        self.save_interval = interval;
        self
    }

    /// Set the number of checkpoints to keep.
    pub fn with_keep_last_n(mut self, n: usize) -> Self {
        self.keep_last_n = n;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.save_interval == 0 {
            return Err(RlError::InvalidConfig {
                param: "save_interval",
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

/// Information about a saved checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    /// Snapshot path prefix (pass to [`ReplayBuffer::load`]).
    pub prefix: PathBuf,
    /// Step at which the checkpoint was saved.
    pub step: usize,
}

/// Periodic replay-buffer checkpointer with retention.
pub struct Checkpointer {
    config: CheckpointerConfig,
}

impl Checkpointer {
    /// Create a new checkpointer.
    ///
    /// Creates the checkpoint directory if it doesn't exist.
    pub fn new(config: CheckpointerConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    /// Check if it's time to save a checkpoint.
    pub fn should_save(&self, step: usize) -> bool {
        step > 0 && step % self.config.save_interval == 0
    }

    /// Prefix a snapshot for `step` is written to.
    pub fn prefix_for(&self, step: usize) -> PathBuf {
        self.config.checkpoint_dir.join(format!("{}{:08}", PREFIX, step))
    }

    /// Save a buffer snapshot for `step` and prune old snapshots.
    pub fn save(&self, buffer: &ReplayBuffer, step: usize) -> Result<PathBuf> {
        let prefix = self.prefix_for(step);
        buffer.save(&prefix)?;
        log::info!(
            "Saved replay checkpoint at step {} ({} transitions) to {}",
            step,
            buffer.len(),
            prefix.display()
        );
        self.cleanup_old_checkpoints()?;
        Ok(prefix)
    }

    /// Restore the snapshot at `prefix` into `buffer`.
    pub fn load(&self, buffer: &mut ReplayBuffer, prefix: &Path) -> Result<()> {
        buffer.load(prefix)
    }

    /// Restore the latest snapshot into `buffer` and return its step.
    pub fn load_latest(&self, buffer: &mut ReplayBuffer) -> Result<usize> {
        let latest = self.find_latest_checkpoint()?;
        buffer.load(&latest.prefix)?;
        log::info!("Resumed replay buffer from step {}", latest.step);
        Ok(latest.step)
    }

    /// Find the latest checkpoint in the checkpoint directory.
    pub fn find_latest_checkpoint(&self) -> Result<CheckpointInfo> {
        self.list_checkpoints()?.pop().ok_or(RlError::NoCheckpoints)
    }

    /// List all checkpoints in the directory, oldest first.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointInfo>> {
        let mut checkpoints: Vec<CheckpointInfo> = fs::read_dir(&self.config.checkpoint_dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                let stem = path.file_name()?.to_str()?.strip_suffix(MARKER_SUFFIX)?;
                let step = stem.strip_prefix(PREFIX)?.parse().ok()?;
                Some(CheckpointInfo {
                    prefix: self.config.checkpoint_dir.join(stem),
                    step,
                })
            })
            .collect();

        checkpoints.sort_by_key(|c| c.step);
        Ok(checkpoints)
    }

    /// Remove snapshots beyond `keep_last_n`, oldest first.
    fn cleanup_old_checkpoints(&self) -> Result<()> {
        if self.config.keep_last_n == 0 {
            return Ok(());
        }

        let checkpoints = self.list_checkpoints()?;
        let excess = checkpoints.len().saturating_sub(self.config.keep_last_n);
        for old in &checkpoints[..excess] {
            for path in snapshot_files(&old.prefix) {
                if let Err(e) = fs::remove_file(&path) {
                    log::warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
            log::debug!("Removed replay checkpoint at step {}", old.step);
        }
        Ok(())
    }
}
