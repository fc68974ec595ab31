//! ABB RAPID program generation.
//!
//! An ordered list of [`Action`]s is compiled against a
//! [`KinematicChain`](armature_kinematics::KinematicChain) into a main module
//! (`main_T.mod`). Tool and work object records go into a separate
//! [`BaseModule`] (`BASE.sys`).
//!
//! ```text
//! Job (TOML) ──► Vec<Action> ──► RapidGenerator ──► GeneratedProgram
//!           └──► BaseModule ───────────────────────► BASE.sys text
//! ```

pub mod action;
pub mod base;
pub mod context;
pub mod error;
pub mod format;
pub mod generator;
pub mod job;
pub mod records;
pub mod speed;
pub mod target;

pub use action::{AbsoluteJointMove, Action, MotionType, Move};
pub use base::BaseModule;
pub use context::{Declaration, GenerationContext, Phase};
pub use error::ActionError;
pub use generator::{GeneratedProgram, RapidGenerator};
pub use job::{Job, JobOutput};
pub use records::{ToolData, WorkObject};
pub use speed::{SpeedData, ZoneData};
pub use target::Target;
