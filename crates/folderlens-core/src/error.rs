//! Error types for analytics operations.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur around the analytics engine.
///
/// The engine itself never fails for validated input; these cover the
/// boundary: input validation, configuration, and report export.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Input items failed boundary validation.
    #[error("Invalid input: {count} validation error(s), first: {first}")]
    InvalidInput {
        count: usize,
        first: ValidationError,
        errors: Vec<ValidationError>,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Report serialization failed.
    #[error("Serialization error: {source}")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// Writing an exported report failed.
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Encoding an exported report failed.
    #[error("Export error: {source}")]
    Export {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AnalyticsError {
    /// Bundle a non-empty list of validation errors.
    ///
    /// Returns `None` when the list is empty.
    pub fn from_validation(errors: Vec<ValidationError>) -> Option<Self> {
        let first = errors.first()?.clone();
        Some(Self::InvalidInput {
            count: errors.len(),
            first,
            errors,
        })
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(source: serde_json::Error) -> Self {
        if source.is_io() {
            Self::Io {
                source: source.into(),
            }
        } else {
            Self::Serialization { source }
        }
    }
}

impl From<std::io::Error> for AnalyticsError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

/// Kind of domain rule violated by an input item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// A rate or score lies outside its documented range.
    OutOfRange,
    /// A float field is NaN or infinite.
    NotFinite,
    /// `successful_attempts` exceeds `total_attempts`.
    AttemptsExceeded,
    /// `updated_at` is earlier than `created_at`.
    TimestampsOutOfOrder,
    /// A filter range has its lower bound above its upper bound.
    InvertedRange,
}

/// A single contract violation found by boundary validation.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{item}: {field}: {message}")]
pub struct ValidationError {
    /// Identifier of the offending item (`filter` for filter errors).
    pub item: CompactString,
    /// Field that failed validation.
    pub field: CompactString,
    /// Human-readable message.
    pub message: String,
    /// Kind of violation.
    pub kind: ViolationKind,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(
        item: impl Into<CompactString>,
        field: impl Into<CompactString>,
        message: impl Into<String>,
        kind: ViolationKind,
    ) -> Self {
        Self {
            item: item.into(),
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create an out-of-range error for a numeric field.
    pub fn out_of_range(
        item: impl Into<CompactString>,
        field: impl Into<CompactString>,
        value: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self::new(
            item,
            field,
            format!("{value} is outside [{min}, {max}]"),
            ViolationKind::OutOfRange,
        )
    }
}

/// Check a float field against an inclusive range, pushing any violation.
pub(crate) fn check_range(
    errors: &mut Vec<ValidationError>,
    item: &str,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !value.is_finite() {
        errors.push(ValidationError::new(
            item,
            field,
            format!("{value} is not a finite number"),
            ViolationKind::NotFinite,
        ));
    } else if value < min || value > max {
        errors.push(ValidationError::out_of_range(item, field, value, min, max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_validation_empty() {
        assert!(AnalyticsError::from_validation(Vec::new()).is_none());
    }

    #[test]
    fn test_from_validation_keeps_all_errors() {
        let errors = vec![
            ValidationError::out_of_range("a1", "completion_rate", 1.5, 0.0, 1.0),
            ValidationError::new("a2", "updated_at", "before created_at", ViolationKind::TimestampsOutOfOrder),
        ];
        let err = AnalyticsError::from_validation(errors).unwrap();
        match err {
            AnalyticsError::InvalidInput { count, first, errors } => {
                assert_eq!(count, 2);
                assert_eq!(first.item, "a1");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_range() {
        let mut errors = Vec::new();
        check_range(&mut errors, "a1", "score", 50.0, 0.0, 100.0);
        assert!(errors.is_empty());

        check_range(&mut errors, "a1", "score", 101.0, 0.0, 100.0);
        check_range(&mut errors, "a1", "score", f64::NAN, 0.0, 100.0);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ViolationKind::OutOfRange);
        assert_eq!(errors[1].kind, ViolationKind::NotFinite);
        assert!(errors[0].to_string().contains("a1: score"));
    }
}
