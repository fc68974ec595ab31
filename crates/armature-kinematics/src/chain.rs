//! Kinematic chain of a six-axis industrial robot.
//!
//! A [`KinematicChain`] is an ordered list of joints from the robot base to
//! the flange. It stores the static transforms (origins) and joint axes
//! needed for forward and inverse kinematics, plus the world placement of
//! the robot, the mounted tool and an optional coupled external axis.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, UnitVector3, Vector3};

use armature_core::config::{ExternalAxisConfig, RobotConfig, ToolConfig};
use armature_core::error::ChainError;
use armature_core::types::{
    pose_is_finite, ExternalAxisKind, ExternalAxisTarget, JointLimits, Pose, INTERNAL_AXIS_COUNT,
};

/// A single joint in the kinematic chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainJoint {
    /// Display name ("axis 1" ... "axis 6" unless given otherwise).
    pub name: String,
    /// Static transform from the previous joint frame to this joint frame,
    /// robot in its home pose.
    pub origin: Isometry3<f64>,
    /// Rotation axis in the joint's local frame.
    pub axis: UnitVector3<f64>,
    /// Allowed joint values in degrees.
    pub limits: JointLimits,
}

/// One robot axis as a datasheet gives it: a point on the axis and its
/// direction, both in the base frame with the robot in its home pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomeAxis {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
    pub limits: JointLimits,
}

impl HomeAxis {
    pub fn new(origin: [f64; 3], direction: [f64; 3], limits: [f64; 2]) -> Self {
        Self {
            origin: Point3::from(origin),
            direction: Vector3::from(direction),
            limits: JointLimits::from(limits),
        }
    }
}

/// Tool mounted on the flange.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    /// TCP relative to the flange frame.
    pub tcp: Pose,
}

impl Tool {
    pub fn new(name: impl Into<String>, tcp: Pose) -> Self {
        Self {
            name: name.into(),
            tcp,
        }
    }

    /// The controller's default tool: TCP on the flange.
    pub fn tool0() -> Self {
        Self::new("tool0", Pose::identity())
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(config.name.clone(), config.tcp.to_pose())
    }
}

impl Default for Tool {
    fn default() -> Self {
        Self::tool0()
    }
}

/// An additional degree of freedom carrying the robot (track or turntable).
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAxis {
    pub name: String,
    pub kind: ExternalAxisKind,
    /// World frame the axis is attached to.
    pub attachment: Pose,
    /// Axis direction in the attachment frame.
    pub axis: UnitVector3<f64>,
    /// Allowed values in mm (linear) or degrees (rotational).
    pub limits: JointLimits,
}

impl ExternalAxis {
    pub fn new(
        name: impl Into<String>,
        kind: ExternalAxisKind,
        attachment: Pose,
        axis: Vector3<f64>,
        limits: JointLimits,
    ) -> Result<Self, ChainError> {
        let name = name.into();
        let axis = normalize_axis(&name, axis)?;
        Ok(Self {
            name,
            kind,
            attachment,
            axis,
            limits,
        })
    }

    pub fn from_config(config: &ExternalAxisConfig) -> Result<Self, ChainError> {
        Self::new(
            config.name.clone(),
            config.kind,
            config.attachment.to_pose(),
            Vector3::from(config.direction),
            JointLimits::from(config.limits),
        )
    }

    /// Axis direction in world coordinates.
    pub fn world_axis(&self) -> UnitVector3<f64> {
        self.attachment.rotation * self.axis
    }

    /// World-space motion produced by moving the axis to `value`.
    ///
    /// Linear axes translate along the axis direction; rotational axes
    /// rotate about the axis line through the attachment origin.
    pub fn motion(&self, value: f64) -> Isometry3<f64> {
        let axis = self.world_axis();
        match self.kind {
            ExternalAxisKind::Linear => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * value),
                UnitQuaternion::identity(),
            ),
            ExternalAxisKind::Rotational => {
                let pivot = self.attachment.translation.vector;
                let rotation = UnitQuaternion::from_axis_angle(&axis, value.to_radians());
                Isometry3::from_parts(Translation3::from(pivot - rotation * pivot), rotation)
            }
        }
    }

    /// Axis value requested for a target at `pose`. No request means zero.
    pub fn resolve(&self, request: Option<ExternalAxisTarget>, pose: &Pose) -> f64 {
        match request {
            None => 0.0,
            Some(ExternalAxisTarget::Value(value)) => value,
            Some(ExternalAxisTarget::Follow) => self.follow(pose),
        }
    }

    /// Value that brings the axis toward `pose`: the signed distance along a
    /// linear axis, or the signed angle around a rotational one measured from
    /// the attachment X axis.
    fn follow(&self, pose: &Pose) -> f64 {
        let axis = self.world_axis().into_inner();
        let offset = pose.translation.vector - self.attachment.translation.vector;
        match self.kind {
            ExternalAxisKind::Linear => offset.dot(&axis),
            ExternalAxisKind::Rotational => {
                let reference = self.attachment.rotation * Vector3::x();
                let reference = reference - axis * reference.dot(&axis);
                let planar = offset - axis * offset.dot(&axis);
                if planar.norm() < 1e-9 || reference.norm() < 1e-9 {
                    return 0.0;
                }
                reference
                    .cross(&planar)
                    .dot(&axis)
                    .atan2(reference.dot(&planar))
                    .to_degrees()
            }
        }
    }

    /// Attachment frame after moving the axis to `value`.
    pub fn posed_frame(&self, value: f64) -> Pose {
        self.motion(value) * self.attachment
    }
}

/// An ordered kinematic chain from robot base to flange.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicChain {
    name: String,
    /// Ordered joints from base to flange.
    joints: Vec<ChainJoint>,
    /// World placement of the robot base.
    mounting_frame: Pose,
    /// Transform from the last joint frame to the flange.
    flange_offset: Isometry3<f64>,
    tool: Tool,
    external_axis: Option<ExternalAxis>,
}

impl KinematicChain {
    /// Build a chain from datasheet axes.
    ///
    /// `flange` is the flange frame in the base frame, home pose. Each joint
    /// frame is placed at its axis point with base-aligned orientation, so
    /// every origin is the offset to the previous axis point.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly six well-formed axes are given.
    pub fn from_home_axes(
        name: impl Into<String>,
        axes: &[HomeAxis],
        flange: Pose,
    ) -> Result<Self, ChainError> {
        if axes.len() != INTERNAL_AXIS_COUNT {
            return Err(ChainError::JointCount {
                expected: INTERNAL_AXIS_COUNT,
                got: axes.len(),
            });
        }

        let mut joints = Vec::with_capacity(axes.len());
        let mut previous = Point3::origin();
        for (i, axis) in axes.iter().enumerate() {
            let joint_name = format!("axis {}", i + 1);
            let offset = axis.origin - previous;
            previous = axis.origin;
            joints.push(ChainJoint {
                axis: normalize_axis(&joint_name, axis.direction)?,
                origin: Isometry3::from_parts(Translation3::from(offset), UnitQuaternion::identity()),
                limits: axis.limits,
                name: joint_name,
            });
        }

        let last = Isometry3::from_parts(
            Translation3::from(previous.coords),
            UnitQuaternion::identity(),
        );
        let chain = Self {
            name: name.into(),
            joints,
            mounting_frame: Pose::identity(),
            flange_offset: last.inverse() * flange,
            tool: Tool::tool0(),
            external_axis: None,
        };
        chain.validate()?;
        Ok(chain)
    }

    /// Build a chain from explicit joints, e.g. frames measured on a robot.
    ///
    /// `limits` must have one interval per joint.
    pub fn from_joints(
        name: impl Into<String>,
        joints: Vec<ChainJoint>,
        limits: &[JointLimits],
        flange_offset: Isometry3<f64>,
    ) -> Result<Self, ChainError> {
        if joints.len() != limits.len() {
            return Err(ChainError::LimitCountMismatch {
                joints: joints.len(),
                limits: limits.len(),
            });
        }
        if joints.len() != INTERNAL_AXIS_COUNT {
            return Err(ChainError::JointCount {
                expected: INTERNAL_AXIS_COUNT,
                got: joints.len(),
            });
        }
        let joints = joints
            .into_iter()
            .zip(limits)
            .map(|(joint, limits)| ChainJoint {
                limits: *limits,
                ..joint
            })
            .collect();
        let chain = Self {
            name: name.into(),
            joints,
            mounting_frame: Pose::identity(),
            flange_offset,
            tool: Tool::tool0(),
            external_axis: None,
        };
        chain.validate()?;
        Ok(chain)
    }

    /// Build a chain from a validated [`RobotConfig`].
    pub fn from_config(config: &RobotConfig) -> Result<Self, ChainError> {
        let axes: Vec<HomeAxis> = config
            .axes
            .iter()
            .map(|a| HomeAxis::new(a.origin, a.direction, a.limits))
            .collect();
        let mut chain = Self::from_home_axes(config.name.clone(), &axes, config.flange.to_pose())?
            .with_mounting_frame(config.mounting.to_pose());
        if let Some(tool) = &config.tool {
            chain = chain.with_tool(Tool::from_config(tool));
        }
        if let Some(ext) = &config.external_axis {
            chain = chain.with_external_axis(ExternalAxis::from_config(ext)?);
        }
        chain.validate()?;
        Ok(chain)
    }

    pub fn with_mounting_frame(mut self, mounting_frame: Pose) -> Self {
        self.mounting_frame = mounting_frame;
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_external_axis(mut self, external_axis: ExternalAxis) -> Self {
        self.external_axis = Some(external_axis);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of internal degrees of freedom.
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    /// Access the joint definitions.
    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    pub fn mounting_frame(&self) -> &Pose {
        &self.mounting_frame
    }

    /// Flange offset after the last joint.
    pub fn flange_offset(&self) -> &Isometry3<f64> {
        &self.flange_offset
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn external_axis(&self) -> Option<&ExternalAxis> {
        self.external_axis.as_ref()
    }

    /// Joint frames in the base frame with every joint at zero.
    pub fn home_frames(&self) -> Vec<Isometry3<f64>> {
        let mut transform = Isometry3::identity();
        self.joints
            .iter()
            .map(|joint| {
                transform *= joint.origin;
                transform
            })
            .collect()
    }

    /// Flange frame in the base frame with every joint at zero.
    pub fn home_flange(&self) -> Isometry3<f64> {
        self.home_frames()
            .last()
            .map_or(self.flange_offset, |last| last * self.flange_offset)
    }

    /// Robot base frame after applying the external axis value.
    pub fn base_frame(&self, external_value: f64) -> Pose {
        match &self.external_axis {
            Some(ext) => ext.motion(external_value) * self.mounting_frame,
            None => self.mounting_frame,
        }
    }

    /// Check every frame, axis and limit interval.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.joints.len() != INTERNAL_AXIS_COUNT {
            return Err(ChainError::JointCount {
                expected: INTERNAL_AXIS_COUNT,
                got: self.joints.len(),
            });
        }
        for joint in &self.joints {
            if !pose_is_finite(&joint.origin) || !joint.axis.iter().all(|v| v.is_finite()) {
                return Err(ChainError::NonFiniteFrame(joint.name.clone()));
            }
            if !joint.limits.is_valid() {
                return Err(ChainError::DegenerateLimits {
                    axis: joint.name.clone(),
                    lower: joint.limits.lower,
                    upper: joint.limits.upper,
                });
            }
        }
        for (label, frame) in [
            ("mounting frame", &self.mounting_frame),
            ("flange", &self.flange_offset),
            ("tool", &self.tool.tcp),
        ] {
            if !pose_is_finite(frame) {
                return Err(ChainError::NonFiniteFrame(label.into()));
            }
        }
        if let Some(ext) = &self.external_axis {
            if !pose_is_finite(&ext.attachment) {
                return Err(ChainError::NonFiniteFrame(ext.name.clone()));
            }
            if !ext.limits.is_valid() {
                return Err(ChainError::DegenerateLimits {
                    axis: ext.name.clone(),
                    lower: ext.limits.lower,
                    upper: ext.limits.upper,
                });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Compute the transform for a single revolute joint at `degrees`.
pub(crate) fn joint_transform(axis: &UnitVector3<f64>, degrees: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::identity(),
        UnitQuaternion::from_axis_angle(axis, degrees.to_radians()),
    )
}

fn normalize_axis(name: &str, axis: Vector3<f64>) -> Result<UnitVector3<f64>, ChainError> {
    if !axis.iter().all(|v| v.is_finite()) {
        return Err(ChainError::NonFiniteFrame(name.to_owned()));
    }
    UnitVector3::try_new(axis, 1e-9).ok_or_else(|| ChainError::ZeroAxis(name.to_owned()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use approx::assert_relative_eq;

    fn irb1200() -> KinematicChain {
        KinematicChain::from_config(&presets::irb1200_7_70()).unwrap()
    }

    #[test]
    fn chain_from_preset() {
        let chain = irb1200();
        assert_eq!(chain.dof(), 6);
        assert_eq!(chain.name(), "IRB1200-7/0.7");
        assert_eq!(chain.joints()[0].name, "axis 1");
        assert!(chain.is_valid());
    }

    #[test]
    fn home_frames_match_datasheet_points() {
        let chain = irb1200();
        let frames = chain.home_frames();
        assert_relative_eq!(frames[1].translation.z, 399.1, epsilon = 1e-9);
        assert_relative_eq!(frames[3].translation.x, 189.0, epsilon = 1e-9);
        assert_relative_eq!(frames[5].translation.x, 433.0, epsilon = 1e-9);
    }

    #[test]
    fn home_flange_is_restored() {
        let chain = irb1200();
        let flange = chain.home_flange();
        assert_relative_eq!(flange.translation.x, 433.0, epsilon = 1e-9);
        assert_relative_eq!(flange.translation.z, 791.1, epsilon = 1e-9);
        // Flange z axis points along base +X at home.
        let z = flange.rotation * Vector3::z();
        assert_relative_eq!(z.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn wrong_axis_count_is_rejected() {
        let axes = [HomeAxis::new([0.0; 3], [0.0, 0.0, 1.0], [-1.0, 1.0]); 5];
        let err = KinematicChain::from_home_axes("short", &axes, Pose::identity()).unwrap_err();
        assert_eq!(
            err,
            ChainError::JointCount {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn zero_axis_is_rejected() {
        let mut axes = [HomeAxis::new([0.0; 3], [0.0, 0.0, 1.0], [-1.0, 1.0]); 6];
        axes[3].direction = Vector3::zeros();
        let err = KinematicChain::from_home_axes("bad", &axes, Pose::identity()).unwrap_err();
        assert_eq!(err, ChainError::ZeroAxis("axis 4".into()));
    }

    #[test]
    fn degenerate_limits_are_rejected() {
        let mut axes = [HomeAxis::new([0.0; 3], [0.0, 0.0, 1.0], [-1.0, 1.0]); 6];
        axes[1].limits = JointLimits::new(5.0, 5.0);
        let err = KinematicChain::from_home_axes("bad", &axes, Pose::identity()).unwrap_err();
        assert!(matches!(err, ChainError::DegenerateLimits { .. }));
    }

    #[test]
    fn limit_count_mismatch_is_rejected() {
        let chain = irb1200();
        let limits = vec![JointLimits::new(-1.0, 1.0); 7];
        let err = KinematicChain::from_joints(
            "measured",
            chain.joints().to_vec(),
            &limits,
            *chain.flange_offset(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChainError::LimitCountMismatch {
                joints: 6,
                limits: 7
            }
        );
    }

    #[test]
    fn from_joints_applies_limits() {
        let chain = irb1200();
        let limits = vec![JointLimits::new(-10.0, 10.0); 6];
        let measured = KinematicChain::from_joints(
            "measured",
            chain.joints().to_vec(),
            &limits,
            *chain.flange_offset(),
        )
        .unwrap();
        assert_eq!(measured.joints()[4].limits, JointLimits::new(-10.0, 10.0));
    }

    #[test]
    fn linear_external_axis_translates_base() {
        let track = ExternalAxis::new(
            "track",
            ExternalAxisKind::Linear,
            Pose::identity(),
            Vector3::x(),
            JointLimits::new(0.0, 4000.0),
        )
        .unwrap();
        let chain = irb1200().with_external_axis(track);
        let base = chain.base_frame(1500.0);
        assert_relative_eq!(base.translation.x, 1500.0, epsilon = 1e-9);
        assert_relative_eq!(base.rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rotational_external_axis_rotates_about_pivot() {
        let attachment = Isometry3::translation(1000.0, 0.0, 0.0);
        let turntable = ExternalAxis::new(
            "turntable",
            ExternalAxisKind::Rotational,
            attachment,
            Vector3::z(),
            JointLimits::new(-180.0, 180.0),
        )
        .unwrap();
        let chain = irb1200().with_external_axis(turntable);
        // Base at world origin, 1000 mm from the pivot: a quarter turn moves
        // it to (1000, -1000).
        let base = chain.base_frame(90.0);
        assert_relative_eq!(base.translation.x, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(base.translation.y, -1000.0, epsilon = 1e-9);
    }

    #[test]
    fn follow_on_linear_track() {
        let track = ExternalAxis::new(
            "track",
            ExternalAxisKind::Linear,
            Isometry3::translation(0.0, 100.0, 0.0),
            Vector3::y(),
            JointLimits::new(0.0, 4000.0),
        )
        .unwrap();
        let pose = Isometry3::translation(600.0, 900.0, 500.0);
        assert_relative_eq!(track.resolve(Some(ExternalAxisTarget::Follow), &pose), 800.0);
        assert_relative_eq!(track.resolve(Some(ExternalAxisTarget::Value(12.5)), &pose), 12.5);
        assert_relative_eq!(track.resolve(None, &pose), 0.0);
    }

    #[test]
    fn follow_on_turntable() {
        let turntable = ExternalAxis::new(
            "turntable",
            ExternalAxisKind::Rotational,
            Pose::identity(),
            Vector3::z(),
            JointLimits::new(-180.0, 180.0),
        )
        .unwrap();
        let follow = Some(ExternalAxisTarget::Follow);
        let pose = Isometry3::translation(0.0, 500.0, 100.0);
        assert_relative_eq!(turntable.resolve(follow, &pose), 90.0, epsilon = 1e-9);
        let on_axis = Isometry3::translation(0.0, 0.0, 100.0);
        assert_relative_eq!(turntable.resolve(follow, &on_axis), 0.0);
    }

    #[test]
    fn clone_is_deep() {
        let chain = irb1200();
        let mut copy = chain.clone();
        copy = copy.with_tool(Tool::new("gripper", Isometry3::translation(0.0, 0.0, 100.0)));
        assert_eq!(chain.tool().name, "tool0");
        assert_eq!(copy.tool().name, "gripper");
    }
}
