use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{pose_from_parts, ExternalAxisKind, JointLimits, Pose, INTERNAL_AXIS_COUNT};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_quaternion() -> [f64; 4] {
    [1.0, 0.0, 0.0, 0.0]
}
fn default_tool_name() -> String {
    "tool0".into()
}

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

/// A frame given as position (mm) + `[w, x, y, z]` quaternion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default)]
    pub origin: [f64; 3],
    #[serde(default = "default_quaternion")]
    pub quaternion: [f64; 4],
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            quaternion: default_quaternion(),
        }
    }
}

impl FrameConfig {
    pub fn to_pose(&self) -> Pose {
        pose_from_parts(self.origin, self.quaternion)
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let finite = self
            .origin
            .iter()
            .chain(self.quaternion.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(invalid(field, "contains non-finite values"));
        }
        if self.quaternion.iter().all(|v| *v == 0.0) {
            return Err(invalid(field, "quaternion must not be zero"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AxisConfig
// ---------------------------------------------------------------------------

/// One robot axis as given in a datasheet: a point on the axis and its
/// direction, both in the robot base frame with the robot in its home pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub origin: [f64; 3],
    pub direction: [f64; 3],
    /// `[lower, upper]` in degrees.
    pub limits: [f64; 2],
}

// ---------------------------------------------------------------------------
// ToolConfig
// ---------------------------------------------------------------------------

/// Tool mounted on the flange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_tool_name")]
    pub name: String,
    /// TCP relative to the flange.
    #[serde(default)]
    pub tcp: FrameConfig,
    /// Mass in kg, used for the tool declaration.
    #[serde(default)]
    pub mass: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            tcp: FrameConfig::default(),
            mass: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalAxisConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAxisConfig {
    pub name: String,
    pub kind: ExternalAxisKind,
    /// World frame the axis is attached to.
    #[serde(default)]
    pub attachment: FrameConfig,
    /// Axis direction, in the attachment frame.
    pub direction: [f64; 3],
    /// `[lower, upper]` in mm (linear) or degrees (rotational).
    pub limits: [f64; 2],
}

// ---------------------------------------------------------------------------
// RobotConfig
// ---------------------------------------------------------------------------

/// Robot description loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub name: String,
    /// World placement of the robot base.
    #[serde(default)]
    pub mounting: FrameConfig,
    /// The six internal axes, base to wrist.
    pub axes: Vec<AxisConfig>,
    /// Flange frame in the base frame, home pose.
    pub flange: FrameConfig,
    #[serde(default)]
    pub tool: Option<ToolConfig>,
    #[serde(default)]
    pub external_axis: Option<ExternalAxisConfig>,
}

impl RobotConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name".into()));
        }
        if self.axes.len() != INTERNAL_AXIS_COUNT {
            return Err(invalid(
                "axes",
                &format!("expected {INTERNAL_AXIS_COUNT} axes, got {}", self.axes.len()),
            ));
        }
        for (i, axis) in self.axes.iter().enumerate() {
            let field = format!("axes[{i}]");
            validate_direction(&field, axis.direction)?;
            if !axis.origin.iter().all(|v| v.is_finite()) {
                return Err(invalid(&field, "origin contains non-finite values"));
            }
            if !JointLimits::from(axis.limits).is_valid() {
                return Err(invalid(&field, "limits must be finite with lower < upper"));
            }
        }
        self.mounting.validate("mounting")?;
        self.flange.validate("flange")?;
        if let Some(tool) = &self.tool {
            if tool.name.trim().is_empty() {
                return Err(ConfigError::MissingField("tool.name".into()));
            }
            tool.tcp.validate("tool.tcp")?;
        }
        if let Some(ext) = &self.external_axis {
            if ext.name.trim().is_empty() {
                return Err(ConfigError::MissingField("external_axis.name".into()));
            }
            ext.attachment.validate("external_axis.attachment")?;
            validate_direction("external_axis", ext.direction)?;
            if !JointLimits::from(ext.limits).is_valid() {
                return Err(invalid(
                    "external_axis",
                    "limits must be finite with lower < upper",
                ));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// GeneratorConfig
// ---------------------------------------------------------------------------

/// Line terminator used in generated program text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    Lf,
    /// The controller's native file convention.
    #[default]
    Crlf,
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

/// Program generator options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub line_ending: LineEnding,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_direction(field: &str, direction: [f64; 3]) -> Result<(), ConfigError> {
    if !direction.iter().all(|v| v.is_finite()) {
        return Err(invalid(field, "direction contains non-finite values"));
    }
    let norm = direction.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm < 1e-9 {
        return Err(invalid(field, "direction must not be zero"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
