//! Error types for the training core.

use std::fmt;
use std::io;

/// Result type for training-core operations.
pub type Result<T> = std::result::Result<T, RlError>;

/// Error types that can occur while storing, collecting or updating.
#[derive(Debug)]
pub enum RlError {
    /// Replay buffer sampled before any transition was stored.
    InsufficientData {
        requested: usize,
        available: usize,
    },
    /// Transition, batch or snapshot shape does not match the configured dimensions.
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Unrecognized named setting (e.g. an unknown learning-rate schedule).
    Configuration(String),
    /// Invalid numeric configuration (zero capacity, zero dims, etc.)
    InvalidConfig {
        param: &'static str,
        message: String,
    },
    /// Advantage batch with zero (or non-finite) standard deviation.
    DegenerateAdvantage {
        mean: f32,
        std: f32,
    },
    /// Failure raised by an environment while resetting or stepping.
    Environment(String),
    /// Failure raised by a policy or update strategy.
    Policy(String),
    /// IO error during save/load.
    Io(io::Error),
    /// Snapshot metadata could not be encoded or decoded.
    Serialization(String),
    /// Snapshot files are present but inconsistent with each other.
    Corrupt(String),
    /// No checkpoints found.
    NoCheckpoints,
}

impl fmt::Display for RlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData { requested, available } => write!(
                f,
                "Insufficient data: requested {} samples, {} transitions stored",
                requested, available
            ),
            Self::Shape { what, expected, actual } => {
                write!(f, "Shape mismatch for {}: expected {}, got {}", what, expected, actual)
            }
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidConfig { param, message } => {
                write!(f, "Invalid configuration for '{}': {}", param, message)
            }
            Self::DegenerateAdvantage { mean, std } => write!(
                f,
                "Degenerate advantage batch: mean={}, std={} (cannot standardize)",
                mean, std
            ),
            Self::Environment(msg) => write!(f, "Environment error: {}", msg),
            Self::Policy(msg) => write!(f, "Policy error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Self::Corrupt(msg) => write!(f, "Corrupt snapshot: {}", msg),
            Self::NoCheckpoints => write!(f, "No checkpoints found"),
        }
    }
}

impl std::error::Error for RlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RlError {
    fn from(e: io::Error) -> Self {
        RlError::Io(e)
    }
}

impl From<serde_json::Error> for RlError {
    fn from(e: serde_json::Error) -> Self {
        RlError::Serialization(e.to_string())
    }
}

impl RlError {
    /// Shorthand for a shape mismatch.
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        RlError::Shape { what, expected, actual }
    }
}
