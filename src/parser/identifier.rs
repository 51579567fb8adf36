//! The canonical phone number type.

use std::fmt;

/// A canonicalized phone number in international form.
///
/// Values of this type only come out of [`normalize`](super::normalize), so
/// they never contain whitespace or dashes and always start with `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps an already-canonical value. Callers must have validated it.
    pub(super) fn from_canonical(value: String) -> Self {
        Self(value)
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the canonical string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
