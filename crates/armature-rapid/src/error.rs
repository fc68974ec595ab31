use armature_core::error::{ChainError, ConfigError, InputError};
use thiserror::Error;

/// Errors raised while validating actions or generating program text.
///
/// Any of these aborts the generation run before text is produced.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },

    #[error("'{0}' is not a valid RAPID identifier")]
    InvalidIdentifier(String),

    #[error("Text must be a single line: {0:?}")]
    MultiLine(String),

    #[error("{what} is out of range: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Robot cannot be used: {0}")]
    Chain(#[from] ChainError),

    #[error("Job configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ActionError::EmptyName { what: "Signal" }.to_string(),
            "Signal name must not be empty"
        );
        assert_eq!(
            ActionError::InvalidIdentifier("1abc".into()).to_string(),
            "'1abc' is not a valid RAPID identifier"
        );
        assert_eq!(
            ActionError::OutOfRange {
                what: "Wait time",
                value: f64::NAN
            }
            .to_string(),
            "Wait time is out of range: NaN"
        );
    }

    #[test]
    fn converts_from_core_errors() {
        let err: ActionError = InputError::NonFinitePose.into();
        assert!(matches!(err, ActionError::Input(_)));
        let err: ActionError = ChainError::UnsupportedGeometry("x".into()).into();
        assert!(err.to_string().contains("closed-form"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<ActionError>();
    }
}
