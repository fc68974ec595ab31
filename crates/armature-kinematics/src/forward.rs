//! Forward kinematics: joint values to world frames.

use armature_core::error::InputError;
use armature_core::types::{Diagnostic, JointPosition, Pose};

use crate::chain::{joint_transform, KinematicChain};

/// Robot posed at one joint position.
#[derive(Debug, Clone, PartialEq)]
pub struct PosedResult {
    /// Robot base frame after applying the external axis.
    pub base_frame: Pose,
    /// World frame of each internal joint, after its own rotation.
    pub joint_frames: Vec<Pose>,
    pub flange_frame: Pose,
    pub tcp_frame: Pose,
    /// Posed attachment frame of the external axis, if the chain has one.
    pub external_axis_frame: Option<Pose>,
    /// Home-to-posed transform of the base link followed by one per joint
    /// link. Applying it to geometry modelled in the home pose places that
    /// geometry at this joint position.
    pub link_transforms: Vec<Pose>,
    /// One flag per internal axis, then one for the external axis.
    pub limit_flags: Vec<bool>,
    /// Logical AND over [`limit_flags`](Self::limit_flags).
    pub in_limits: bool,
    /// One diagnostic per axis outside its limits.
    pub diagnostics: Vec<Diagnostic>,
}

impl PosedResult {
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().map(|d| d.message.as_str())
    }
}

/// Pose the robot at `position`.
///
/// Joints outside their limits still produce frames; they are flagged and
/// reported in [`PosedResult::diagnostics`].
///
/// # Errors
///
/// Returns an error if `position` has too many external values or contains
/// non-finite values.
pub fn forward_kinematics(
    chain: &KinematicChain,
    position: &JointPosition,
) -> Result<PosedResult, InputError> {
    position.validate()?;

    let external_value = position.external.first().copied().unwrap_or(0.0);
    let base_frame = chain.base_frame(external_value);

    let mut transform = base_frame;
    let mut joint_frames = Vec::with_capacity(chain.dof());
    let mut limit_flags = Vec::with_capacity(chain.dof() + 1);
    let mut diagnostics = Vec::new();

    for (i, (joint, &value)) in chain.joints().iter().zip(&position.internal).enumerate() {
        transform *= joint.origin;
        transform *= joint_transform(&joint.axis, value);
        joint_frames.push(transform);

        let ok = joint.limits.contains(value);
        if !ok {
            diagnostics.push(Diagnostic::joint_out_of_limits(i + 1, value, joint.limits));
        }
        limit_flags.push(ok);
    }

    let flange_frame = transform * chain.flange_offset();
    let tcp_frame = flange_frame * chain.tool().tcp;

    let external_axis_frame = chain.external_axis().map(|ext| {
        let ok = ext.limits.contains(external_value);
        if !ok {
            diagnostics.push(Diagnostic::external_out_of_limits(
                &ext.name,
                external_value,
                ext.limits,
            ));
        }
        limit_flags.push(ok);
        ext.posed_frame(external_value)
    });

    let mounting = chain.mounting_frame();
    let mut link_transforms = Vec::with_capacity(chain.dof() + 1);
    link_transforms.push(base_frame * mounting.inverse());
    for (posed, home) in joint_frames.iter().zip(chain.home_frames()) {
        link_transforms.push(posed * (mounting * home).inverse());
    }

    for d in &diagnostics {
        tracing::warn!("{d}");
    }

    Ok(PosedResult {
        base_frame,
        joint_frames,
        flange_frame,
        tcp_frame,
        external_axis_frame,
        link_transforms,
        in_limits: limit_flags.iter().all(|ok| *ok),
        limit_flags,
        diagnostics,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ExternalAxis, Tool};
    use crate::presets;
    use approx::assert_relative_eq;
    use armature_core::types::{DiagnosticKind, ExternalAxisKind, JointLimits};
    use nalgebra::{Isometry3, Point3, Vector3};

    fn irb1200() -> KinematicChain {
        KinematicChain::from_config(&presets::irb1200_7_70()).unwrap()
    }

    #[test]
    fn zero_position_gives_home_flange() {
        let chain = irb1200();
        let posed = forward_kinematics(&chain, &JointPosition::default()).unwrap();
        assert_relative_eq!(posed.tcp_frame.translation.x, 433.0, epsilon = 1e-9);
        assert_relative_eq!(posed.tcp_frame.translation.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(posed.tcp_frame.translation.z, 791.1, epsilon = 1e-9);
        assert!(posed.in_limits);
        assert_eq!(posed.limit_flags, vec![true; 6]);
        assert!(posed.diagnostics.is_empty());
    }

    #[test]
    fn axis_one_rotates_about_vertical() {
        let chain = irb1200();
        let posed =
            forward_kinematics(&chain, &JointPosition::new([90.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
                .unwrap();
        assert_relative_eq!(posed.flange_frame.translation.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(posed.flange_frame.translation.y, 433.0, epsilon = 1e-9);
        assert_relative_eq!(posed.flange_frame.translation.z, 791.1, epsilon = 1e-9);
    }

    #[test]
    fn axis_two_tilts_arm_forward() {
        let chain = irb1200();
        let posed =
            forward_kinematics(&chain, &JointPosition::new([0.0, 90.0, 0.0, 0.0, 0.0, 0.0]))
                .unwrap();
        // The upper arm (350 mm) lies along +X; the forearm points down.
        let elbow = posed.joint_frames[2].translation;
        assert_relative_eq!(elbow.x, 350.0, epsilon = 1e-9);
        assert_relative_eq!(elbow.z, 399.1, epsilon = 1e-9);
        assert_relative_eq!(posed.flange_frame.translation.x, 392.0, epsilon = 1e-9);
        assert_relative_eq!(posed.flange_frame.translation.z, 399.1 - 433.0, epsilon = 1e-9);
    }

    #[test]
    fn tool_offset_is_applied() {
        let chain = irb1200().with_tool(Tool::new("pen", Isometry3::translation(0.0, 0.0, 100.0)));
        let posed = forward_kinematics(&chain, &JointPosition::default()).unwrap();
        // Flange z points along base +X at home.
        assert_relative_eq!(posed.tcp_frame.translation.x, 533.0, epsilon = 1e-6);
        assert_relative_eq!(posed.flange_frame.translation.x, 433.0, epsilon = 1e-9);
    }

    #[test]
    fn mounting_frame_moves_everything() {
        let chain = irb1200().with_mounting_frame(Isometry3::translation(0.0, 0.0, 500.0));
        let posed = forward_kinematics(&chain, &JointPosition::default()).unwrap();
        assert_relative_eq!(posed.tcp_frame.translation.z, 1291.1, epsilon = 1e-9);
        assert_relative_eq!(posed.base_frame.translation.z, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn out_of_limits_is_flagged_not_failed() {
        let chain = irb1200();
        let posed =
            forward_kinematics(&chain, &JointPosition::new([0.0, 0.0, 95.0, 0.0, 0.0, 0.0]))
                .unwrap();
        assert!(!posed.in_limits);
        assert_eq!(posed.limit_flags, vec![true, true, false, true, true, true]);
        assert_eq!(posed.diagnostics.len(), 1);
        assert_eq!(
            posed.diagnostics[0].kind,
            DiagnosticKind::JointOutOfLimits { axis: 3 }
        );
        assert!(posed
            .messages()
            .next()
            .unwrap()
            .starts_with("The position of robot axis 3"));
    }

    #[test]
    fn external_axis_moves_base_and_is_checked() {
        let track = ExternalAxis::new(
            "track",
            ExternalAxisKind::Linear,
            Pose::identity(),
            Vector3::y(),
            JointLimits::new(0.0, 2000.0),
        )
        .unwrap();
        let chain = irb1200().with_external_axis(track);

        let posed = forward_kinematics(
            &chain,
            &JointPosition::new([0.0; 6]).with_external(vec![750.0]),
        )
        .unwrap();
        assert_relative_eq!(posed.tcp_frame.translation.y, 750.0, epsilon = 1e-9);
        assert_eq!(posed.limit_flags.len(), 7);
        assert!(posed.in_limits);
        let frame = posed.external_axis_frame.unwrap();
        assert_relative_eq!(frame.translation.y, 750.0, epsilon = 1e-9);

        let posed = forward_kinematics(
            &chain,
            &JointPosition::new([0.0; 6]).with_external(vec![-10.0]),
        )
        .unwrap();
        assert!(!posed.in_limits);
        assert!(matches!(
            posed.diagnostics[0].kind,
            DiagnosticKind::ExternalAxisOutOfLimits { .. }
        ));
    }

    #[test]
    fn link_transforms_move_home_geometry() {
        let chain = irb1200();
        let position = JointPosition::new([30.0, 20.0, -10.0, 45.0, 60.0, -90.0]);
        let posed = forward_kinematics(&chain, &position).unwrap();
        assert_eq!(posed.link_transforms.len(), 7);
        assert_relative_eq!(posed.link_transforms[0].translation.vector.norm(), 0.0);

        // A point on the last link at home (the flange) lands on the posed flange.
        let home_flange = Point3::from(chain.home_flange().translation.vector);
        let moved = posed.link_transforms[6] * home_flange;
        assert_relative_eq!(moved.coords, posed.flange_frame.translation.vector, epsilon = 1e-9);
    }

    #[test]
    fn rejects_too_many_external_values() {
        let chain = irb1200();
        let position = JointPosition::new([0.0; 6]).with_external(vec![0.0; 7]);
        assert_eq!(
            forward_kinematics(&chain, &position).unwrap_err(),
            InputError::ExternalAxisCount { max: 6, got: 7 }
        );
    }
}
