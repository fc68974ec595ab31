//! Number and name formatting for RAPID text.

use armature_core::types::{JointPosition, Pose, EXTERNAL_AXIS_SLOTS};

/// Decimals written for positions and joint values.
pub const POSITION_DECIMALS: usize = 2;
/// Decimals written for quaternion components.
pub const ORIENTATION_DECIMALS: usize = 6;

/// Written for unused external axis slots.
pub const NOT_APPLICABLE: &str = "9E9";

/// Longest identifier the controller accepts.
const MAX_IDENTIFIER_LEN: usize = 32;

/// Round to at most `decimals` places, dropping trailing zeros.
///
/// Halves round away from zero; negative zero is written as `0`.
pub fn number(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    let mut text = format!("{rounded:.decimals$}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".into();
    }
    text
}

/// Comma separated list of numbers.
pub fn number_list(values: &[f64], decimals: usize) -> String {
    values
        .iter()
        .map(|v| number(*v, decimals))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The six external axis slots, unused ones as [`NOT_APPLICABLE`].
pub fn external_slots(values: &[f64]) -> String {
    (0..EXTERNAL_AXIS_SLOTS)
        .map(|i| {
            values
                .get(i)
                .map_or_else(|| NOT_APPLICABLE.to_owned(), |v| number(*v, POSITION_DECIMALS))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `[j1, ..., j6], [e1, ..., e6]` as used by jointtarget records.
pub fn joint_record(position: &JointPosition) -> String {
    format!(
        "[{}], [{}]",
        number_list(&position.internal, POSITION_DECIMALS),
        external_slots(&position.external)
    )
}

/// `[x, y, z]` of a pose.
pub fn position(pose: &Pose) -> String {
    let t = &pose.translation;
    number_list(&[t.x, t.y, t.z], POSITION_DECIMALS)
}

/// `[q1, q2, q3, q4]` (w first) of a pose.
pub fn orientation(pose: &Pose) -> String {
    let q = pose.rotation.quaternion();
    number_list(&[q.w, q.i, q.j, q.k], ORIENTATION_DECIMALS)
}

/// Whether `name` is a RAPID identifier: a letter, then letters, digits or
/// underscores, at most 32 characters.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= MAX_IDENTIFIER_LEN
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use armature_core::types::pose_from_parts;

    #[test]
    fn number_trims_trailing_zeros() {
        assert_eq!(number(10.0, 2), "10");
        assert_eq!(number(10.5, 2), "10.5");
        assert_eq!(number(0.125, 2), "0.13");
        assert_eq!(number(-2.345678, 2), "-2.35");
        assert_eq!(number(791.1, 2), "791.1");
    }

    #[test]
    fn number_orientation_precision() {
        assert_eq!(number(std::f64::consts::FRAC_1_SQRT_2, 6), "0.707107");
        assert_eq!(number(1.0, 6), "1");
    }

    #[test]
    fn number_has_no_negative_zero() {
        assert_eq!(number(-0.0, 2), "0");
        assert_eq!(number(-0.001, 2), "0");
    }

    #[test]
    fn external_slots_padding() {
        assert_eq!(external_slots(&[]), "9E9, 9E9, 9E9, 9E9, 9E9, 9E9");
        assert_eq!(external_slots(&[250.0]), "250, 9E9, 9E9, 9E9, 9E9, 9E9");
    }

    #[test]
    fn joint_record_layout() {
        let pos = JointPosition::new([10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(
            joint_record(&pos),
            "[10, 20, 30, 40, 50, 60], [9E9, 9E9, 9E9, 9E9, 9E9, 9E9]"
        );
    }

    #[test]
    fn pose_parts() {
        let pose = pose_from_parts([300.0, -12.346, 500.0], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(position(&pose), "300, -12.35, 500");
        assert_eq!(orientation(&pose), "0, 0, 1, 0");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("home_jm"));
        assert!(is_identifier("v100"));
        assert!(!is_identifier("1home"));
        assert!(!is_identifier("home jm"));
        assert!(!is_identifier(""));
        assert!(!is_identifier(&"a".repeat(33)));
    }
}
