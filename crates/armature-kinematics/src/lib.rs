//! Forward and inverse kinematics for six-axis industrial robots.
//!
//! # Architecture
//!
//! ```text
//! RobotConfig ──► KinematicChain ──┬─► forward_kinematics ──► PosedResult
//!                                  └─► AnalyticSolver ──────► IkSolution
//! ```
//!
//! The [`KinematicChain`] is built once from a [`RobotConfig`](armature_core::config::RobotConfig)
//! or a preset. Forward kinematics works for any chain; the closed-form
//! solver accepts chains with the ABB axis layout and a spherical wrist.

pub mod chain;
pub mod forward;
pub mod inverse;
pub mod presets;

pub use chain::{ChainJoint, ExternalAxis, HomeAxis, KinematicChain, Tool};
pub use forward::{forward_kinematics, PosedResult};
pub use inverse::{inverse_kinematics, wrap_degrees, AnalyticSolver, IkConfig, IkSolution};
