//! Value types shared by the kinematics engines and the program generator.
//!
//! Units follow the controller convention: rotational joint values in
//! degrees, linear joint values and positions in millimetres, orientations
//! as unit quaternions.

use std::fmt;

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Number of internal (robot) axes.
pub const INTERNAL_AXIS_COUNT: usize = 6;

/// Number of external axis slots in a joint target.
pub const EXTERNAL_AXIS_SLOTS: usize = 6;

/// Value stored in unused external axis slots ("not applicable").
pub const NOT_APPLICABLE: f64 = 9e9;

/// A rigid world-frame pose (position in mm + orientation).
pub type Pose = Isometry3<f64>;

/// Build a [`Pose`] from a position and a `[w, x, y, z]` quaternion.
///
/// The quaternion is normalized.
pub fn pose_from_parts(position: [f64; 3], quaternion: [f64; 4]) -> Pose {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        quaternion[0],
        quaternion[1],
        quaternion[2],
        quaternion[3],
    ));
    Isometry3::from_parts(
        Translation3::new(position[0], position[1], position[2]),
        rotation,
    )
}

/// Whether every component of a pose is finite.
pub fn pose_is_finite(pose: &Pose) -> bool {
    pose.translation.vector.iter().all(|v| v.is_finite())
        && pose.rotation.coords.iter().all(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// JointLimits
// ---------------------------------------------------------------------------

/// Closed `[lower, upper]` interval a joint value must stay in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub lower: f64,
    pub upper: f64,
}

impl JointLimits {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// A limit interval is well-formed when both ends are finite and
    /// `lower < upper`.
    pub fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

impl From<[f64; 2]> for JointLimits {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

// ---------------------------------------------------------------------------
// ExternalAxisKind
// ---------------------------------------------------------------------------

/// Kind of motion an external axis adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAxisKind {
    /// Translation along the axis direction (track, gantry).
    Linear,
    /// Rotation about the axis direction (turntable, positioner).
    Rotational,
}

// ---------------------------------------------------------------------------
// JointPosition
// ---------------------------------------------------------------------------

/// Joint values of the six internal axes plus up to six external axes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointPosition {
    /// Internal axis values, always exactly six.
    pub internal: [f64; INTERNAL_AXIS_COUNT],
    /// External axis values, `0..=6` entries.
    #[serde(default)]
    pub external: Vec<f64>,
}

impl JointPosition {
    pub const fn new(internal: [f64; INTERNAL_AXIS_COUNT]) -> Self {
        Self {
            internal,
            external: Vec::new(),
        }
    }

    /// Build from caller-supplied slices, checking their shapes and values.
    pub fn from_slices(internal: &[f64], external: &[f64]) -> Result<Self, InputError> {
        let internal: [f64; INTERNAL_AXIS_COUNT] =
            internal
                .try_into()
                .map_err(|_| InputError::InternalAxisCount {
                    expected: INTERNAL_AXIS_COUNT,
                    got: internal.len(),
                })?;
        let position = Self {
            internal,
            external: external.to_vec(),
        };
        position.validate()?;
        Ok(position)
    }

    pub fn with_external(mut self, external: Vec<f64>) -> Self {
        self.external = external;
        self
    }

    /// Check the external slot count and that every value is finite.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.external.len() > EXTERNAL_AXIS_SLOTS {
            return Err(InputError::ExternalAxisCount {
                max: EXTERNAL_AXIS_SLOTS,
                got: self.external.len(),
            });
        }
        if let Some(index) = self
            .internal
            .iter()
            .chain(self.external.iter())
            .position(|v| !v.is_finite())
        {
            return Err(InputError::NonFiniteJoint { index });
        }
        Ok(())
    }

    /// All six external slots, unused ones set to [`NOT_APPLICABLE`].
    pub fn external_slots(&self) -> [f64; EXTERNAL_AXIS_SLOTS] {
        let mut slots = [NOT_APPLICABLE; EXTERNAL_AXIS_SLOTS];
        for (slot, value) in slots.iter_mut().zip(&self.external) {
            *slot = *value;
        }
        slots
    }
}

// ---------------------------------------------------------------------------
// AxisConfiguration
// ---------------------------------------------------------------------------

/// Selector choosing one of the inverse kinematics branches.
///
/// Bit 0 selects the wrist flip (axis 5 negative), bit 1 the alternate elbow
/// branch, bit 2 the shoulder-back branch (wrist centre behind axis 1).
/// Values outside `0..=7` are accepted but fall back to branch 0 during the
/// solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisConfiguration(pub i32);

impl AxisConfiguration {
    pub const WRIST_FLIP: i32 = 0b001;
    pub const ELBOW_ALTERNATE: i32 = 0b010;
    pub const SHOULDER_BACK: i32 = 0b100;
    /// Number of distinct branches.
    pub const BRANCH_COUNT: i32 = 8;

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn from_branches(shoulder_back: bool, elbow_alternate: bool, wrist_flip: bool) -> Self {
        let mut value = 0;
        if wrist_flip {
            value |= Self::WRIST_FLIP;
        }
        if elbow_alternate {
            value |= Self::ELBOW_ALTERNATE;
        }
        if shoulder_back {
            value |= Self::SHOULDER_BACK;
        }
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 >= 0 && self.0 < Self::BRANCH_COUNT
    }

    /// The branch actually used by the solver.
    pub const fn effective(self) -> Self {
        if self.is_valid() { self } else { Self(0) }
    }

    pub const fn wrist_flip(self) -> bool {
        self.0 & Self::WRIST_FLIP != 0
    }

    pub const fn elbow_alternate(self) -> bool {
        self.0 & Self::ELBOW_ALTERNATE != 0
    }

    pub const fn shoulder_back(self) -> bool {
        self.0 & Self::SHOULDER_BACK != 0
    }
}

impl fmt::Display for AxisConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TargetPose
// ---------------------------------------------------------------------------

/// How the external axis value of a target is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAxisTarget {
    /// Use this joint value directly.
    Value(f64),
    /// Derive the value from the target position: the signed distance along
    /// a linear axis, or the signed angle around a rotational axis.
    Follow,
}

/// A TCP pose the robot should reach.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPose {
    pub pose: Pose,
    pub configuration: AxisConfiguration,
    pub external: Option<ExternalAxisTarget>,
}

impl TargetPose {
    pub const fn new(pose: Pose, configuration: AxisConfiguration) -> Self {
        Self {
            pose,
            configuration,
            external: None,
        }
    }

    pub const fn with_external(mut self, external: ExternalAxisTarget) -> Self {
        self.external = Some(external);
        self
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !pose_is_finite(&self.pose) {
            return Err(InputError::NonFinitePose);
        }
        if let Some(ExternalAxisTarget::Value(v)) = self.external {
            if !v.is_finite() {
                return Err(InputError::NonFiniteExternal);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// What a non-fatal diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Internal axis (1-based) outside its limit interval.
    JointOutOfLimits { axis: usize },
    /// External axis value outside its limit interval.
    ExternalAxisOutOfLimits { name: String },
    /// Wrist centre beyond the reach of the arm.
    OutOfReach,
    /// Axis 5 close to zero; axes 4 and 6 are not independent.
    WristSingularity,
    /// Wrist centre on axis 1; axis 1 is not determined.
    ShoulderSingularity,
    /// Configuration selector outside the valid branch set.
    InvalidConfiguration { value: i32 },
    /// A second, different declaration for an already declared name.
    DeclarationConflict { name: String },
}

/// A non-fatal finding surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn joint_out_of_limits(axis: usize, value: f64, limits: JointLimits) -> Self {
        Self::new(
            DiagnosticKind::JointOutOfLimits { axis },
            format!(
                "The position of robot axis {axis} ({value:.2}) is not within its limits [{}, {}].",
                limits.lower, limits.upper
            ),
        )
    }

    pub fn external_out_of_limits(name: &str, value: f64, limits: JointLimits) -> Self {
        Self::new(
            DiagnosticKind::ExternalAxisOutOfLimits {
                name: name.to_owned(),
            },
            format!(
                "The position of external axis {name} ({value:.2}) is not within its limits [{}, {}].",
                limits.lower, limits.upper
            ),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn joint_limits_validity() {
        assert!(JointLimits::new(-170.0, 170.0).is_valid());
        assert!(!JointLimits::new(10.0, 10.0).is_valid());
        assert!(!JointLimits::new(20.0, 10.0).is_valid());
        assert!(!JointLimits::new(f64::NEG_INFINITY, 10.0).is_valid());
    }

    #[test]
    fn joint_limits_contains_bounds() {
        let limits = JointLimits::new(-100.0, 135.0);
        assert!(limits.contains(-100.0));
        assert!(limits.contains(135.0));
        assert!(!limits.contains(135.01));
    }

    #[test]
    fn joint_position_default_is_zero() {
        let pos = JointPosition::default();
        assert_eq!(pos.internal, [0.0; 6]);
        assert!(pos.external.is_empty());
    }

    #[test]
    fn joint_position_from_slices_checks_length() {
        let err = JointPosition::from_slices(&[0.0; 5], &[]).unwrap_err();
        assert_eq!(
            err,
            InputError::InternalAxisCount {
                expected: 6,
                got: 5
            }
        );

        let err = JointPosition::from_slices(&[0.0; 6], &[0.0; 7]).unwrap_err();
        assert_eq!(err, InputError::ExternalAxisCount { max: 6, got: 7 });
    }

    #[test]
    fn joint_position_rejects_nan() {
        let err = JointPosition::from_slices(&[0.0, 0.0, f64::NAN, 0.0, 0.0, 0.0], &[])
            .unwrap_err();
        assert_eq!(err, InputError::NonFiniteJoint { index: 2 });
    }

    #[test]
    fn external_slots_are_padded() {
        let pos = JointPosition::new([0.0; 6]).with_external(vec![250.0]);
        let slots = pos.external_slots();
        assert_relative_eq!(slots[0], 250.0);
        assert!(slots[1..].iter().all(|v| *v == NOT_APPLICABLE));
    }

    #[test]
    fn axis_configuration_bits() {
        let cfg = AxisConfiguration::from_branches(true, false, true);
        assert_eq!(cfg.value(), 5);
        assert!(cfg.shoulder_back());
        assert!(!cfg.elbow_alternate());
        assert!(cfg.wrist_flip());
    }

    #[test]
    fn axis_configuration_out_of_range_falls_back_to_zero() {
        assert_eq!(AxisConfiguration::new(8).effective(), AxisConfiguration::new(0));
        assert_eq!(AxisConfiguration::new(-1).effective(), AxisConfiguration::new(0));
        assert_eq!(AxisConfiguration::new(3).effective(), AxisConfiguration::new(3));
    }

    #[test]
    fn pose_from_parts_normalizes_quaternion() {
        let pose = pose_from_parts([1.0, 2.0, 3.0], [2.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(pose.rotation.w, 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.translation.z, 3.0);
    }

    #[test]
    fn target_pose_rejects_non_finite() {
        let pose = pose_from_parts([f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]);
        let target = TargetPose::new(pose, AxisConfiguration::default());
        assert_eq!(target.validate(), Err(InputError::NonFinitePose));

        let target = TargetPose::new(Pose::identity(), AxisConfiguration::default())
            .with_external(ExternalAxisTarget::Value(f64::INFINITY));
        assert_eq!(target.validate(), Err(InputError::NonFiniteExternal));
    }

    #[test]
    fn diagnostic_names_the_axis() {
        let d = Diagnostic::joint_out_of_limits(3, 95.0, JointLimits::new(-200.0, 70.0));
        assert_eq!(d.kind, DiagnosticKind::JointOutOfLimits { axis: 3 });
        assert!(d.to_string().contains("robot axis 3"));
    }
}
