// armature-core: value types, error taxonomy and TOML configuration shared by
// the kinematics engines and the RAPID generator.

pub mod config;
pub mod error;
pub mod types;

pub mod prelude {
    pub use crate::config::{
        AxisConfig, ExternalAxisConfig, FrameConfig, GeneratorConfig, LineEnding, RobotConfig,
        ToolConfig,
    };
    pub use crate::error::{ArmatureError, ChainError, ConfigError, InputError};
    pub use crate::types::{
        AxisConfiguration, Diagnostic, DiagnosticKind, ExternalAxisKind, ExternalAxisTarget,
        JointLimits, JointPosition, Pose, TargetPose, EXTERNAL_AXIS_SLOTS, INTERNAL_AXIS_COUNT,
    };
}
