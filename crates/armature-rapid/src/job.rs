//! TOML job files: robot, actions and base module records in one document.
//!
//! ```toml
//! module = "MainModule"
//!
//! [robot]
//! preset = "IRB1200"
//!
//! [[tools]]
//! name = "gripper"
//! tcp = { origin = [0.0, 0.0, 120.0] }
//!
//! [[actions]]
//! type = "absolute_joint_move"
//! name = "home"
//! joints = [0.0, 0.0, 0.0, 0.0, 30.0, 0.0]
//!
//! [[actions]]
//! type = "override_tool"
//! tool = "gripper"
//!
//! [[actions]]
//! type = "move"
//! motion = "linear"
//! speed = 200
//! target = { name = "pick", origin = [450.0, 0.0, 300.0], quaternion = [0.0, 0.0, 1.0, 0.0] }
//! ```

use std::path::Path;

use armature_core::config::{ExternalAxisConfig, FrameConfig, GeneratorConfig, RobotConfig, ToolConfig};
use armature_core::error::ConfigError;
use armature_core::types::{AxisConfiguration, ExternalAxisTarget, JointPosition};
use armature_kinematics::{presets, KinematicChain, Tool};
use serde::Deserialize;

use crate::action::{AbsoluteJointMove, Action, Move, MotionType};
use crate::base::BaseModule;
use crate::error::ActionError;
use crate::generator::{GeneratedProgram, RapidGenerator};
use crate::records::{ToolData, WorkObject};
use crate::speed::SpeedData;
use crate::target::Target;

// ---------------------------------------------------------------------------
// Robot
// ---------------------------------------------------------------------------

/// A preset with optional placement overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetRobot {
    pub preset: String,
    #[serde(default)]
    pub mounting: Option<FrameConfig>,
    #[serde(default)]
    pub tool: Option<ToolConfig>,
    #[serde(default)]
    pub external_axis: Option<ExternalAxisConfig>,
}

/// `[robot]` table: a preset reference or a full description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RobotSource {
    Preset(PresetRobot),
    Inline(RobotConfig),
}

impl RobotSource {
    pub fn to_config(&self) -> Result<RobotConfig, ConfigError> {
        let config = match self {
            Self::Preset(p) => {
                let mut config = presets::by_name(&p.preset)?;
                if let Some(mounting) = &p.mounting {
                    config.mounting = mounting.clone();
                }
                if p.tool.is_some() {
                    config.tool = p.tool.clone();
                }
                if p.external_axis.is_some() {
                    config.external_axis = p.external_axis.clone();
                }
                config
            }
            Self::Inline(config) => config.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowKeyword {
    Follow,
}

/// External axis request: a number, or `"follow"`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExternalConfig {
    Value(f64),
    Follow(FollowKeyword),
}

impl From<ExternalConfig> for ExternalAxisTarget {
    fn from(value: ExternalConfig) -> Self {
        match value {
            ExternalConfig::Value(v) => Self::Value(v),
            ExternalConfig::Follow(_) => Self::Follow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    #[serde(flatten)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub configuration: i32,
    #[serde(default)]
    pub external: Option<ExternalConfig>,
}

impl TargetConfig {
    fn to_target(&self) -> Target {
        let target = Target::new(
            self.name.clone(),
            self.frame.to_pose(),
            AxisConfiguration::new(self.configuration),
        );
        match self.external {
            Some(external) => target.with_external(external.into()),
            None => target,
        }
    }
}

/// A predefined speed (`100` means `v100`) or a full speed table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SpeedConfig {
    Predefined(u32),
    Custom(SpeedData),
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self::Predefined(5)
    }
}

impl SpeedConfig {
    fn to_speed(&self, field: &str) -> Result<SpeedData, ConfigError> {
        match self {
            Self::Predefined(v) => SpeedData::predefined(*v).ok_or_else(|| ConfigError::InvalidValue {
                field: field.to_owned(),
                message: format!("v{v} is not a predefined speed"),
            }),
            Self::Custom(speed) => Ok(speed.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionConfig {
    Linear,
    Joint,
}

/// One `[[actions]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    Move {
        target: TargetConfig,
        motion: MotionConfig,
        #[serde(default)]
        speed: SpeedConfig,
        #[serde(default)]
        precision: i32,
        #[serde(default)]
        tool: Option<String>,
    },
    AbsoluteJointMove {
        name: String,
        joints: [f64; 6],
        #[serde(default)]
        external: Vec<f64>,
        #[serde(default)]
        speed: SpeedConfig,
        #[serde(default)]
        precision: i32,
        #[serde(default)]
        tool: Option<String>,
    },
    WaitDigitalInput {
        signal: String,
        state: bool,
    },
    OverrideTool {
        tool: String,
    },
    SetDigitalOutput {
        signal: String,
        value: bool,
    },
    WaitTime {
        seconds: f64,
    },
    Comment {
        text: String,
    },
    CodeLine {
        code: String,
    },
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A complete generation job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    /// Name of the main module.
    pub module: String,
    pub robot: RobotSource,
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Tools declared in the base module, also available to actions by name.
    #[serde(default)]
    pub tools: Vec<ToolData>,
    #[serde(default)]
    pub work_objects: Vec<WorkObject>,
    #[serde(default)]
    pub custom_code: Vec<String>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

/// Program and base module text of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    pub program: GeneratedProgram,
    pub base: String,
}

impl Job {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn chain(&self) -> Result<KinematicChain, ActionError> {
        let config = self.robot.to_config()?;
        Ok(KinematicChain::from_config(&config)?)
    }

    /// Resolve the action entries. Tool names refer to the robot's tool,
    /// `tool0` or an entry of `tools`.
    pub fn actions(&self, chain: &KinematicChain) -> Result<Vec<Action>, ActionError> {
        self.actions
            .iter()
            .enumerate()
            .map(|(i, entry)| self.action(i, entry, chain))
            .collect()
    }

    fn action(&self, index: usize, entry: &ActionConfig, chain: &KinematicChain) -> Result<Action, ActionError> {
        let field = format!("actions[{index}]");
        let tool = |name: &Option<String>| -> Result<Option<Tool>, ActionError> {
            name.as_deref().map(|n| self.find_tool(n, chain, &field)).transpose()
        };
        let action = match entry {
            ActionConfig::Move {
                target,
                motion,
                speed,
                precision,
                tool: tool_name,
            } => {
                let motion = match motion {
                    MotionConfig::Linear => MotionType::Linear,
                    MotionConfig::Joint => MotionType::Joint,
                };
                Action::Move(Move {
                    target: target.to_target(),
                    speed: speed.to_speed(&field)?,
                    motion,
                    precision: *precision,
                    tool: tool(tool_name)?,
                })
            }
            ActionConfig::AbsoluteJointMove {
                name,
                joints,
                external,
                speed,
                precision,
                tool: tool_name,
            } => Action::AbsoluteJointMove(AbsoluteJointMove {
                name: name.clone(),
                position: JointPosition::new(*joints).with_external(external.clone()),
                speed: speed.to_speed(&field)?,
                precision: *precision,
                tool: tool(tool_name)?,
            }),
            ActionConfig::WaitDigitalInput { signal, state } => Action::WaitDigitalInput {
                signal: signal.clone(),
                state: *state,
            },
            ActionConfig::OverrideTool { tool: name } => Action::OverrideTool {
                tool: self.find_tool(name, chain, &field)?,
            },
            ActionConfig::SetDigitalOutput { signal, value } => Action::SetDigitalOutput {
                signal: signal.clone(),
                value: *value,
            },
            ActionConfig::WaitTime { seconds } => Action::WaitTime { seconds: *seconds },
            ActionConfig::Comment { text } => Action::Comment { text: text.clone() },
            ActionConfig::CodeLine { code } => Action::CodeLine { code: code.clone() },
        };
        Ok(action)
    }

    fn find_tool(&self, name: &str, chain: &KinematicChain, field: &str) -> Result<Tool, ActionError> {
        if chain.tool().name == name {
            return Ok(chain.tool().clone());
        }
        if let Some(data) = self.tools.iter().find(|t| t.name == name) {
            data.validate()?;
            return Ok(Tool::new(name, data.tcp.to_pose()));
        }
        if name == "tool0" {
            return Ok(Tool::tool0());
        }
        Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            message: format!("unknown tool '{name}'"),
        }
        .into())
    }

    /// Base module records. The robot's own tool, with its configured mass,
    /// is added when it is not `tool0` and not listed in `tools`.
    pub fn base_module(&self) -> Result<BaseModule, ActionError> {
        let config = self.robot.to_config()?;
        let mut tools = Vec::new();
        if let Some(robot_tool) = &config.tool {
            if robot_tool.name != "tool0" && !self.tools.iter().any(|t| t.name == robot_tool.name) {
                tools.push(ToolData::from_config(robot_tool));
            }
        }
        tools.extend(self.tools.iter().cloned());
        Ok(BaseModule {
            tools,
            work_objects: self.work_objects.clone(),
            custom_code: self.custom_code.clone(),
        })
    }

    /// Build the chain, compile the actions and render the base module.
    pub fn run(&self) -> Result<JobOutput, ActionError> {
        let chain = self.chain()?;
        let actions = self.actions(&chain)?;
        let program = RapidGenerator::new(self.module.clone(), &chain)?
            .with_config(self.generator.clone())
            .generate(&actions)?;
        let base = self.base_module()?.to_code(&self.generator)?;
        Ok(JobOutput { program, base })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
