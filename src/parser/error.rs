//! Error types for phone number normalization.

use thiserror::Error;

/// Reasons a raw phone number is rejected before any lookup is attempted.
///
/// Rejections are recorded as data (an `INVALID_FORMAT` row); they never
/// abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Nothing left after stripping whitespace and dashes.
    #[error("phone number is empty after removing spaces and dashes")]
    Empty,

    /// Number is not in international form.
    #[error("phone number '{value}' is missing the leading '+'\n  Suggestion: Use international format, e.g. +17202764654")]
    MissingPlus {
        /// Canonicalized value that was rejected.
        value: String,
    },
}

impl NormalizeError {
    /// Creates a `MissingPlus` rejection for the given canonical value.
    #[must_use]
    pub fn missing_plus(value: impl Into<String>) -> Self {
        Self::MissingPlus {
            value: value.into(),
        }
    }
}
