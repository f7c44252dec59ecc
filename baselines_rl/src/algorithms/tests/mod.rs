//! Tests for the algorithms module.
//!
//! # Test Organization
//!
//! - `gae_tests`: advantage estimation and standardization
//! - `ppo` tests live next to the update loop in `algorithms::ppo::tests`
