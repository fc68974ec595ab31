//! Shared test fixtures and utilities for armature crates.
//!
//! Provides preset robot chains, random joint positions that stay clear of
//! singularities, and deterministic RNG setup.

pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{irb1200, irb1200_on_track, irb4600, ROBOT_TOML};
pub use rng::{random_joint_position, seeded_rng};
