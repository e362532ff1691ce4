//! # Error Hierarchy
//!
//! Validation errors raised while constructing domain values. Each variant
//! carries the offending input or field name so that a caller can surface
//! an actionable message without inspecting logs.

use thiserror::Error;

/// Validation errors for domain newtypes and record inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the rejected field.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters (got {actual})")]
    TooLong {
        /// Name of the rejected field.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Status name is not one of the four lifecycle states.
    #[error("unknown grievance status: \"{0}\" (expected pending, in-progress, resolved or rejected)")]
    UnknownStatus(String),

    /// Role name is not `admin` or `user`.
    #[error("unknown role: \"{0}\" (expected admin or user)")]
    UnknownRole(String),

    /// Identifier does not match its `<prefix><number>` format.
    #[error("invalid {kind} id: \"{value}\" (expected {prefix}<number>)")]
    MalformedId {
        /// Which identifier family was being parsed.
        kind: &'static str,
        /// Expected leading character.
        prefix: char,
        /// The rejected input.
        value: String,
    },
}

/// Trim `value` and enforce a non-empty, bounded length.
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_trims() {
        assert_eq!(require_text("title", "  Water leak \n", 50).unwrap(), "Water leak");
    }

    #[test]
    fn require_text_rejects_whitespace_only() {
        let err = require_text("title", " \t ", 50).unwrap_err();
        assert_eq!(err, ValidationError::EmptyField { field: "title" });
        assert_eq!(err.to_string(), "title must not be empty");
    }

    #[test]
    fn require_text_counts_characters_not_bytes() {
        // Four characters, eight bytes.
        assert!(require_text("category", "ÉÉÉÉ", 4).is_ok());
        let err = require_text("category", "ÉÉÉÉÉ", 4).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "category",
                max: 4,
                actual: 5
            }
        );
    }

    #[test]
    fn malformed_id_display() {
        let err = ValidationError::MalformedId {
            kind: "grievance",
            prefix: 'g',
            value: "x9".to_string(),
        };
        assert_eq!(err.to_string(), "invalid grievance id: \"x9\" (expected g<number>)");
    }
}
