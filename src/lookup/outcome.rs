//! Classification of a single lookup attempt.

use std::fmt;

/// First-column tag of a record whose lookup returned a non-200 status.
pub const API_ERROR_TAG: &str = "API_ERROR";

/// First-column tag of a record whose request never got a response.
pub const REQUEST_FAILED_TAG: &str = "REQUEST_FAILED";

/// First-column tag of a record rejected before any lookup.
pub const INVALID_FORMAT_TAG: &str = "INVALID_FORMAT";

/// Result of looking up one identifier.
///
/// Every variant is terminal for that identifier in the current run and is
/// persisted as a row; none of them is raised as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// HTTP 200; the body split into opaque fields, in requested order.
    Success(Vec<String>),
    /// The service answered with a non-200 status.
    ApiError(u16),
    /// Timeout, connection, DNS or body-read failure.
    RequestFailed(String),
    /// The identifier failed normalization and was never sent.
    InvalidFormat,
}

impl Outcome {
    /// Tag written in the first column for failure outcomes, `None` for success.
    #[must_use]
    pub fn failure_tag(&self) -> Option<&'static str> {
        match self {
            Self::Success(_) => None,
            Self::ApiError(_) => Some(API_ERROR_TAG),
            Self::RequestFailed(_) => Some(REQUEST_FAILED_TAG),
            Self::InvalidFormat => Some(INVALID_FORMAT_TAG),
        }
    }

    /// Whether the lookup succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(values) => write!(f, "success ({} fields)", values.len()),
            Self::ApiError(status) => write!(f, "{API_ERROR_TAG} (HTTP {status})"),
            Self::RequestFailed(cause) => write!(f, "{REQUEST_FAILED_TAG}: {cause}"),
            Self::InvalidFormat => f.write_str(INVALID_FORMAT_TAG),
        }
    }
}

/// Whether a stored first-column value marks a failed remote lookup.
///
/// `INVALID_FORMAT` is not included: re-running cannot change a rejection.
#[must_use]
pub fn is_remote_failure_tag(value: &str) -> bool {
    matches!(value.trim(), API_ERROR_TAG | REQUEST_FAILED_TAG)
}
