//! Robot chains used across the test suites.

use armature_core::types::{ExternalAxisKind, JointLimits, Pose};
use armature_kinematics::{presets, ExternalAxis, KinematicChain};
use nalgebra::Vector3;

/// TOML description of an IRB 1200 carrying a 120 mm gripper.
pub const ROBOT_TOML: &str = r#"
name = "IRB1200"

[flange]
origin = [433.0, 0.0, 791.1]
quaternion = [0.7071068, 0.0, 0.7071068, 0.0]

[[axes]]
origin = [0.0, 0.0, 235.1]
direction = [0.0, 0.0, 1.0]
limits = [-170.0, 170.0]

[[axes]]
origin = [0.0, 0.0, 399.1]
direction = [0.0, 1.0, 0.0]
limits = [-100.0, 135.0]

[[axes]]
origin = [0.0, 0.0, 749.1]
direction = [0.0, 1.0, 0.0]
limits = [-200.0, 70.0]

[[axes]]
origin = [189.0, 0.0, 791.1]
direction = [1.0, 0.0, 0.0]
limits = [-270.0, 270.0]

[[axes]]
origin = [351.0, 0.0, 791.1]
direction = [0.0, 1.0, 0.0]
limits = [-130.0, 130.0]

[[axes]]
origin = [433.0, 0.0, 791.1]
direction = [1.0, 0.0, 0.0]
limits = [-360.0, 360.0]

[tool]
name = "gripper"
tcp = { origin = [0.0, 0.0, 120.0] }
mass = 1.5
"#;

/// IRB 1200 on the floor with tool0.
pub fn irb1200() -> KinematicChain {
    KinematicChain::from_config(&presets::irb1200_7_70()).unwrap()
}

/// IRB 4600 on the floor with tool0.
pub fn irb4600() -> KinematicChain {
    KinematicChain::from_config(&presets::irb4600_40_255()).unwrap()
}

/// IRB 1200 riding a 3 m track along world Y.
pub fn irb1200_on_track() -> KinematicChain {
    let track = ExternalAxis::new(
        "track",
        ExternalAxisKind::Linear,
        Pose::identity(),
        Vector3::y(),
        JointLimits::new(0.0, 3000.0),
    )
    .unwrap();
    irb1200().with_external_axis(track)
}
