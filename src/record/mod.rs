//! Fixed-width output records.
//!
//! [`to_record`] is the single place where lookup outcomes of any width are
//! reconciled with the configured [`Schema`]. Records never change width
//! mid-run, and the last field always names the identifier that produced
//! the row.

mod schema;

pub use schema::{
    DEFAULT_QUERY_LABEL, MIN_SCHEMA_FIELDS, Schema, SchemaError, SchemaField,
};

use tracing::debug;

use crate::lookup::Outcome;

/// Sentinel for fields the service did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// One output row, exactly `schema.len()` fields wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRecord {
    fields: Vec<String>,
}

impl LookupRecord {
    /// The ordered fields.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Value of the Query column.
    #[must_use]
    pub fn query(&self) -> &str {
        self.fields.last().map_or("", String::as_str)
    }

    /// Value of the first column (status or failure tag).
    #[must_use]
    pub fn status(&self) -> &str {
        self.fields.first().map_or("", String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields. Never true for mapped records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Maps an outcome to a record of exactly `schema.len()` fields.
///
/// Successful responses are padded with [`NOT_AVAILABLE`] or truncated to
/// the schema width; fields beyond the schema are dropped. Failures produce
/// `[tag, N/A, ..., identifier]`. In every case the last field is forced to
/// `identifier`.
#[must_use]
pub fn to_record(outcome: &Outcome, identifier: &str, schema: &Schema) -> LookupRecord {
    let width = schema.len();
    let mut fields: Vec<String> = match outcome {
        Outcome::Success(values) => {
            if values.len() > width {
                debug!(
                    identifier,
                    received = values.len(),
                    expected = width,
                    "dropping extra response fields"
                );
            }
            values.iter().take(width).cloned().collect()
        }
        Outcome::ApiError(_) | Outcome::RequestFailed(_) | Outcome::InvalidFormat => {
            let tag = outcome.failure_tag().unwrap_or(NOT_AVAILABLE);
            vec![tag.to_string()]
        }
    };

    fields.resize(width, NOT_AVAILABLE.to_string());
    if let Some(last) = fields.last_mut() {
        identifier.clone_into(last);
    }

    LookupRecord { fields }
}
