//! Named learning-rate multiplier schedules.
//!
//! Every schedule is a total function of `(steps_so_far, total_timesteps)`
//! returning a multiplier in `[0, 1]`. Progress is clamped to `[0, 1]`, and a
//! zero `total_timesteps` counts as finished training.
//!
//! | name                 | multiplier at progress p                                  |
//! |----------------------|-----------------------------------------------------------|
//! | `constant`           | 1                                                         |
//! | `linear`             | 1 - p                                                     |
//! | `middle_drop`        | 1 - p, dropping to 0.075 once 1 - p < 0.75                |
//! | `double_linear_con`  | 1 - 2p, held at 0.125 once 1 - 2p < 0.125                 |
//! | `double_middle_drop` | 1 - p, 0.075 once 1 - p < 0.75, 0.125 once 1 - p < 0.25   |

use std::fmt;
use std::str::FromStr;

use crate::error::RlError;

/// Learning-rate multiplier schedule selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Constant,
    Linear,
    MiddleDrop,
    DoubleLinearCon,
    DoubleMiddleDrop,
}

impl Schedule {
    /// All schedules, in documentation order.
    pub const ALL: [Schedule; 5] = [
        Schedule::Constant,
        Schedule::Linear,
        Schedule::MiddleDrop,
        Schedule::DoubleLinearCon,
        Schedule::DoubleMiddleDrop,
    ];

    /// Configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Schedule::Constant => "constant",
            Schedule::Linear => "linear",
            Schedule::MiddleDrop => "middle_drop",
            Schedule::DoubleLinearCon => "double_linear_con",
            Schedule::DoubleMiddleDrop => "double_middle_drop",
        }
    }

    /// Multiplier for the current training progress.
    pub fn value(&self, steps_so_far: usize, total_timesteps: usize) -> f64 {
        let progress = if total_timesteps == 0 {
            1.0
        } else {
            (steps_so_far as f64 / total_timesteps as f64).min(1.0)
        };
        let remaining = 1.0 - progress;

        let mult = match self {
            Schedule::Constant => 1.0,
            Schedule::Linear => remaining,
            Schedule::MiddleDrop => {
                let eps = 0.75;
                if remaining < eps {
                    eps * 0.1
                } else {
                    remaining
                }
            }
            Schedule::DoubleLinearCon => {
                let eps = 0.125;
                let remaining = 1.0 - 2.0 * progress;
                if remaining < eps {
                    eps
                } else {
                    remaining
                }
            }
            Schedule::DoubleMiddleDrop => {
                let (eps1, eps2) = (0.75, 0.25);
                if remaining < eps2 {
                    eps2 * 0.5
                } else if remaining < eps1 {
                    eps1 * 0.1
                } else {
                    remaining
                }
            }
        };
        mult.clamp(0.0, 1.0)
    }
}

impl FromStr for Schedule {
    type Err = RlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schedule::ALL
            .iter()
            .copied()
            .find(|sched| sched.name() == s)
            .ok_or_else(|| {
                RlError::Configuration(format!(
                    "unknown learning rate schedule '{}' (expected one of: constant, linear, \
                     middle_drop, double_linear_con, double_middle_drop)",
                    s
                ))
            })
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Learning rate scheduler trait.
///
/// Implementations provide step-dependent learning rates for training loops.
pub trait LRScheduler: Send + Sync {
    /// Get the learning rate for a given step.
    fn get_lr(&self, step: usize) -> f64;
}

/// Base learning rate scaled by a named schedule over a fixed horizon.
#[derive(Debug, Clone)]
pub struct ScheduledLR {
    base_lr: f64,
    schedule: Schedule,
    total_timesteps: usize,
}

impl ScheduledLR {
    /// Create a scheduled learning rate.
    pub fn new(base_lr: f64, schedule: Schedule, total_timesteps: usize) -> Self {
        Self {
            base_lr,
            schedule,
            total_timesteps,
        }
    }

    /// Get the base learning rate.
    pub fn base_lr(&self) -> f64 {
        self.base_lr
    }

    /// Get the schedule.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }
}

impl LRScheduler for ScheduledLR {
    fn get_lr(&self, step: usize) -> f64 {
        self.base_lr * self.schedule.value(step, self.total_timesteps)
    }
}
