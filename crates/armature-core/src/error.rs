use thiserror::Error;

/// Top-level error type for armature.
///
/// Only structural problems end up here. Kinematic infeasibility (unreachable
/// targets, singular wrists, joints outside their limits) is reported through
/// [`Diagnostic`](crate::types::Diagnostic) values instead.
#[derive(Debug, Error)]
pub enum ArmatureError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Unknown robot preset: {0}")]
    UnknownPreset(String),
}

/// Malformed kinematic chain descriptions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("Expected {expected} joints, got {got}")]
    JointCount { expected: usize, got: usize },

    #[error("Joint count ({joints}) does not match limit count ({limits})")]
    LimitCountMismatch { joints: usize, limits: usize },

    #[error("Degenerate limit interval for {axis}: [{lower}, {upper}]")]
    DegenerateLimits {
        axis: String,
        lower: f64,
        upper: f64,
    },

    #[error("Frame of {0} contains non-finite values")]
    NonFiniteFrame(String),

    #[error("Axis direction of {0} has zero length")]
    ZeroAxis(String),

    #[error("Geometry not supported by the closed-form solver: {0}")]
    UnsupportedGeometry(String),
}

/// Invalid call inputs (wrong shapes, non-finite numbers).
///
/// Copy + static messages so it can be returned from hot solver paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Internal joint vector must have {expected} values, got {got}")]
    InternalAxisCount { expected: usize, got: usize },

    #[error("At most {max} external axis values are allowed, got {got}")]
    ExternalAxisCount { max: usize, got: usize },

    #[error("Joint value at index {index} is not finite")]
    NonFiniteJoint { index: usize },

    #[error("Target pose contains non-finite values")]
    NonFinitePose,

    #[error("External axis target is not finite")]
    NonFiniteExternal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armature_error_from_config_error() {
        let err = ConfigError::MissingField("axes".into());
        let top: ArmatureError = err.into();
        assert!(matches!(top, ArmatureError::Config(_)));
        assert!(top.to_string().contains("axes"));
    }

    #[test]
    fn armature_error_from_chain_error() {
        let err = ChainError::JointCount {
            expected: 6,
            got: 5,
        };
        let top: ArmatureError = err.into();
        assert!(matches!(top, ArmatureError::Chain(_)));
        assert!(top.to_string().contains("got 5"));
    }

    #[test]
    fn armature_error_from_input_error() {
        let err = InputError::NonFinitePose;
        let top: ArmatureError = err.into();
        assert!(matches!(top, ArmatureError::Input(_)));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn input_error_is_copy() {
        let err = InputError::NonFiniteJoint { index: 3 };
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn chain_error_display_messages() {
        assert_eq!(
            ChainError::LimitCountMismatch {
                joints: 6,
                limits: 7
            }
            .to_string(),
            "Joint count (6) does not match limit count (7)"
        );
        assert_eq!(
            ChainError::DegenerateLimits {
                axis: "axis 2".into(),
                lower: 10.0,
                upper: 10.0
            }
            .to_string(),
            "Degenerate limit interval for axis 2: [10, 10]"
        );
        assert_eq!(
            ChainError::ZeroAxis("axis 4".into()).to_string(),
            "Axis direction of axis 4 has zero length"
        );
    }

    #[test]
    fn input_error_display_messages() {
        assert_eq!(
            InputError::InternalAxisCount {
                expected: 6,
                got: 4
            }
            .to_string(),
            "Internal joint vector must have 6 values, got 4"
        );
        assert_eq!(
            InputError::ExternalAxisCount { max: 6, got: 7 }.to_string(),
            "At most 6 external axis values are allowed, got 7"
        );
        assert_eq!(
            InputError::NonFiniteJoint { index: 2 }.to_string(),
            "Joint value at index 2 is not finite"
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn errors_are_send_sync() {
        assert_send_sync::<ArmatureError>();
        assert_send_sync::<ChainError>();
    }
}
