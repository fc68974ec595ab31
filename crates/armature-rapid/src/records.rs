//! Tool and work object records declared in the base module.

use armature_core::config::{FrameConfig, ToolConfig};
use armature_kinematics::Tool;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::format;

/// Load data keeps gram and sub-millimetre resolution.
const LOAD_DECIMALS: usize = 3;

const fn default_mass() -> f64 {
    0.001
}
const fn default_center_of_gravity() -> [f64; 3] {
    [0.0, 0.0, 0.001]
}
const fn default_true() -> bool {
    true
}

/// A robot-held tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolData {
    pub name: String,
    /// TCP relative to the flange.
    #[serde(default)]
    pub tcp: FrameConfig,
    /// Mass in kg.
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Centre of gravity in the flange frame (mm).
    #[serde(default = "default_center_of_gravity")]
    pub center_of_gravity: [f64; 3],
}

impl ToolData {
    pub fn new(name: impl Into<String>, tcp: FrameConfig) -> Self {
        Self {
            name: name.into(),
            tcp,
            mass: default_mass(),
            center_of_gravity: default_center_of_gravity(),
        }
    }

    /// Record for a kinematic tool.
    pub fn from_tool(tool: &Tool) -> Self {
        let q = tool.tcp.rotation.quaternion();
        let t = &tool.tcp.translation;
        Self::new(
            tool.name.clone(),
            FrameConfig {
                origin: [t.x, t.y, t.z],
                quaternion: [q.w, q.i, q.j, q.k],
            },
        )
    }

    /// Record for a configured robot tool, carrying its mass. An unset
    /// (zero) mass falls back to the controller default.
    pub fn from_config(config: &ToolConfig) -> Self {
        let data = Self::new(config.name.clone(), config.tcp.clone());
        if config.mass > 0.0 {
            data.with_mass(config.mass, default_center_of_gravity())
        } else {
            data
        }
    }

    pub fn with_mass(mut self, mass: f64, center_of_gravity: [f64; 3]) -> Self {
        self.mass = mass;
        self.center_of_gravity = center_of_gravity;
        self
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        validate_name(&self.name, "Tool")?;
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ActionError::OutOfRange {
                what: "Tool mass",
                value: self.mass,
            });
        }
        validate_frame(&self.tcp)
    }

    /// `PERS tooldata` line.
    pub fn declaration(&self) -> String {
        format!(
            "PERS tooldata {} := [TRUE, {}, [{}, [{}], [1, 0, 0, 0], 0, 0, 0]];",
            self.name,
            frame(&self.tcp),
            format::number(self.mass, LOAD_DECIMALS),
            format::number_list(&self.center_of_gravity, LOAD_DECIMALS)
        )
    }
}

/// A work object: user frame plus object frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkObject {
    pub name: String,
    /// User frame in world coordinates.
    #[serde(default)]
    pub user_frame: FrameConfig,
    /// Object frame relative to the user frame.
    #[serde(default)]
    pub object_frame: FrameConfig,
    /// Whether the user frame is fixed in the cell (not moved by an external
    /// mechanical unit).
    #[serde(default = "default_true")]
    pub fixed_user_frame: bool,
}

impl WorkObject {
    pub fn new(name: impl Into<String>, user_frame: FrameConfig) -> Self {
        Self {
            name: name.into(),
            user_frame,
            object_frame: FrameConfig::default(),
            fixed_user_frame: true,
        }
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        validate_name(&self.name, "Work object")?;
        validate_frame(&self.user_frame)?;
        validate_frame(&self.object_frame)
    }

    /// `PERS wobjdata` line.
    pub fn declaration(&self) -> String {
        format!(
            "PERS wobjdata {} := [FALSE, {}, \"\", {}, {}];",
            self.name,
            if self.fixed_user_frame { "TRUE" } else { "FALSE" },
            frame(&self.user_frame),
            frame(&self.object_frame)
        )
    }
}

/// `[[x, y, z], [q1, q2, q3, q4]]`
fn frame(config: &FrameConfig) -> String {
    let pose = config.to_pose();
    format!(
        "[[{}], [{}]]",
        format::position(&pose),
        format::orientation(&pose)
    )
}

fn validate_name(name: &str, what: &'static str) -> Result<(), ActionError> {
    if name.is_empty() {
        return Err(ActionError::EmptyName { what });
    }
    if !format::is_identifier(name) {
        return Err(ActionError::InvalidIdentifier(name.to_owned()));
    }
    Ok(())
}

fn validate_frame(config: &FrameConfig) -> Result<(), ActionError> {
    if let Some(value) = config
        .origin
        .iter()
        .chain(&config.quaternion)
        .find(|v| !v.is_finite())
    {
        return Err(ActionError::OutOfRange {
            what: "Frame value",
            value: *value,
        });
    }
    let norm = config.quaternion.iter().map(|q| q * q).sum::<f64>().sqrt();
    if norm < 1e-9 {
        return Err(ActionError::OutOfRange {
            what: "Quaternion norm",
            value: norm,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
