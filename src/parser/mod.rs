//! Phone number normalization.
//!
//! Raw cells from the input table are turned into canonical [`Identifier`]s
//! here. The same canonicalization is applied to values read back from the
//! output store, so progress comparisons are made on identical forms.
//!
//! # Example
//!
//! ```
//! use phonecheck_core::parser::{NormalizeError, normalize};
//!
//! let id = normalize(" +1 720-276-4654 ").unwrap();
//! assert_eq!(id.as_str(), "+17202764654");
//!
//! assert!(matches!(normalize("5551234"), Err(NormalizeError::MissingPlus { .. })));
//! ```

mod error;
mod identifier;

pub use error::NormalizeError;
pub use identifier::Identifier;

use tracing::trace;

/// Removes every whitespace character and every `-` from `raw`.
///
/// This never fails; use [`normalize`] to also validate the result.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Canonicalizes and validates a raw phone number.
///
/// # Errors
///
/// Returns [`NormalizeError::Empty`] when nothing remains after
/// canonicalization, and [`NormalizeError::MissingPlus`] when the value does
/// not start with `+`.
pub fn normalize(raw: &str) -> Result<Identifier, NormalizeError> {
    let canonical = canonicalize(raw);
    if canonical.is_empty() {
        return Err(NormalizeError::Empty);
    }
    if !canonical.starts_with('+') {
        return Err(NormalizeError::missing_plus(canonical));
    }
    trace!(raw, canonical = %canonical, "normalized phone number");
    Ok(Identifier::from_canonical(canonical))
}
