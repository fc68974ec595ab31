//! Datasheet geometry of common ABB robots.
//!
//! Axis points are in mm in the robot base frame with the robot at home; the
//! flange carries the controller's tool0 orientation (flange Z along base +X).

use armature_core::config::{AxisConfig, FrameConfig, RobotConfig};
use armature_core::error::ConfigError;

/// `[w, x, y, z]` of a quarter turn about +Y.
const FLANGE_QUATERNION: [f64; 4] = [
    std::f64::consts::FRAC_1_SQRT_2,
    0.0,
    std::f64::consts::FRAC_1_SQRT_2,
    0.0,
];

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 2] = ["IRB1200-7/0.7", "IRB4600-40/2.55"];

/// IRB 1200, 7 kg payload, 0.7 m reach.
pub fn irb1200_7_70() -> RobotConfig {
    abb_robot(
        "IRB1200-7/0.7",
        [
            [0.0, 0.0, 235.1],
            [0.0, 0.0, 399.1],
            [0.0, 0.0, 749.1],
            [189.0, 0.0, 791.1],
            [351.0, 0.0, 791.1],
            [433.0, 0.0, 791.1],
        ],
        [
            [-170.0, 170.0],
            [-100.0, 135.0],
            [-200.0, 70.0],
            [-270.0, 270.0],
            [-130.0, 130.0],
            [-360.0, 360.0],
        ],
    )
}

/// IRB 4600, 40 kg payload, 2.55 m reach.
pub fn irb4600_40_255() -> RobotConfig {
    abb_robot(
        "IRB4600-40/2.55",
        [
            [0.0, 0.0, 0.0],
            [175.0, 0.0, 495.0],
            [175.0, 0.0, 1590.0],
            [175.0, 0.0, 1765.0],
            [1445.0, 0.0, 1765.0],
            [1580.0, 0.0, 1765.0],
        ],
        [
            [-180.0, 180.0],
            [-90.0, 150.0],
            [-180.0, 75.0],
            [-400.0, 400.0],
            [-120.0, 125.0],
            [-400.0, 400.0],
        ],
    )
}

/// Look up a preset by its model name (case-insensitive).
pub fn by_name(name: &str) -> Result<RobotConfig, ConfigError> {
    match name.to_ascii_uppercase().as_str() {
        "IRB1200-7/0.7" | "IRB1200" => Ok(irb1200_7_70()),
        "IRB4600-40/2.55" | "IRB4600" => Ok(irb4600_40_255()),
        _ => Err(ConfigError::UnknownPreset(name.to_owned())),
    }
}

/// ABB axis layout: Z, Y, Y, X, Y, X. The flange sits on axis 6.
fn abb_robot(name: &str, points: [[f64; 3]; 6], limits: [[f64; 2]; 6]) -> RobotConfig {
    const DIRECTIONS: [[f64; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
    ];
    RobotConfig {
        name: name.into(),
        mounting: FrameConfig::default(),
        axes: points
            .iter()
            .zip(DIRECTIONS)
            .zip(limits)
            .map(|((origin, direction), limits)| AxisConfig {
                origin: *origin,
                direction,
                limits,
            })
            .collect(),
        flange: FrameConfig {
            origin: points[5],
            quaternion: FLANGE_QUATERNION,
        },
        tool: None,
        external_axis: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
