use armature_core::types::{AxisConfiguration, ExternalAxisTarget, JointPosition, Pose, TargetPose};

use crate::error::ActionError;
use crate::format;

/// A named TCP target.
///
/// Declares as `<name>_rt` (robtarget) for linear moves and `<name>_jt`
/// (jointtarget) for joint moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub pose: Pose,
    pub configuration: AxisConfiguration,
    pub external: Option<ExternalAxisTarget>,
}

impl Target {
    pub fn new(name: impl Into<String>, pose: Pose, configuration: AxisConfiguration) -> Self {
        Self {
            name: name.into(),
            pose,
            configuration,
            external: None,
        }
    }

    pub fn with_external(mut self, external: ExternalAxisTarget) -> Self {
        self.external = Some(external);
        self
    }

    pub fn rob_target_name(&self) -> String {
        format!("{}_rt", self.name)
    }

    pub fn joint_target_name(&self) -> String {
        format!("{}_jt", self.name)
    }

    pub fn to_target_pose(&self) -> TargetPose {
        TargetPose {
            pose: self.pose,
            configuration: self.configuration,
            external: self.external,
        }
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        if self.name.is_empty() {
            return Err(ActionError::EmptyName { what: "Target" });
        }
        let declared = self.rob_target_name();
        if !format::is_identifier(&declared) {
            return Err(ActionError::InvalidIdentifier(declared));
        }
        self.to_target_pose().validate()?;
        Ok(())
    }

    /// `VAR robtarget` line. `external` holds the resolved external axis
    /// values.
    pub fn rob_target_declaration(&self, external: &[f64]) -> String {
        format!(
            "\tVAR robtarget {}:=[[{}], [{}],[0,0,0,{}], [{}]];",
            self.rob_target_name(),
            format::position(&self.pose),
            format::orientation(&self.pose),
            self.configuration,
            format::external_slots(external)
        )
    }

    /// `CONST jointtarget` line for solved joint values.
    pub fn joint_target_declaration(&self, position: &JointPosition) -> String {
        format!(
            "\tCONST jointtarget {}:=[{}];",
            self.joint_target_name(),
            format::joint_record(position)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use armature_core::types::pose_from_parts;

    fn target() -> Target {
        Target::new(
            "pick",
            pose_from_parts([450.0, 0.0, 500.0], [0.0, 0.0, 1.0, 0.0]),
            AxisConfiguration::new(0),
        )
    }

    #[test]
    fn names() {
        let t = target();
        assert_eq!(t.rob_target_name(), "pick_rt");
        assert_eq!(t.joint_target_name(), "pick_jt");
    }

    #[test]
    fn rob_target_line() {
        assert_eq!(
            target().rob_target_declaration(&[]),
            "\tVAR robtarget pick_rt:=[[450, 0, 500], [0, 0, 1, 0],[0,0,0,0], [9E9, 9E9, 9E9, 9E9, 9E9, 9E9]];"
        );
        assert!(target()
            .rob_target_declaration(&[1200.0])
            .ends_with("[1200, 9E9, 9E9, 9E9, 9E9, 9E9]];"));
    }

    #[test]
    fn joint_target_line() {
        let pos = JointPosition::new([0.0, 12.5, -3.333, 0.0, 45.0, 0.0]);
        assert_eq!(
            target().joint_target_declaration(&pos),
            "\tCONST jointtarget pick_jt:=[[0, 12.5, -3.33, 0, 45, 0], [9E9, 9E9, 9E9, 9E9, 9E9, 9E9]];"
        );
    }

    #[test]
    fn validation() {
        assert!(target().validate().is_ok());
        let mut t = target();
        t.name = "bad name".into();
        assert!(matches!(t.validate(), Err(ActionError::InvalidIdentifier(_))));
        let mut t = target();
        t.pose.translation.z = f64::NAN;
        assert!(matches!(t.validate(), Err(ActionError::Input(_))));
    }
}
