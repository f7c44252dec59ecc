//! Learning rate scheduling module.
//!
//! ## Available Schedules
//!
//! - `constant`, `linear`, `middle_drop`, `double_linear_con`,
//!   `double_middle_drop` (see [`Schedule`])
//!
//! ## Example
//!
//! ```rust
//! use baselines_rl::scheduling::{LRScheduler, Schedule, ScheduledLR};
//!
//! let schedule: Schedule = "linear".parse().unwrap();
//! assert_eq!(schedule.value(250, 1000), 0.75);
//!
//! let lr = ScheduledLR::new(3e-4, schedule, 1000);
//! assert!((lr.get_lr(500) - 1.5e-4).abs() < 1e-12);
//! ```

pub mod lr_schedule;


pub use lr_schedule::{LRScheduler, Schedule, ScheduledLR};
