//! Output schema: the ordered field list that fixes record width.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of fields: one status column plus the Query column.
pub const MIN_SCHEMA_FIELDS: usize = 2;

/// Label of the Query column in the default schema.
pub const DEFAULT_QUERY_LABEL: &str = "Query";

/// API field names and output labels of the default schema.
const DEFAULT_FIELDS: &[(&str, &str)] = &[
    ("status", "Status"),
    ("numberType", "Number Type"),
    ("numberValid", "Number Valid"),
    ("numberValidForRegion", "numberValidForRegion"),
    ("isDisposible", "Is Disposable"),
    ("numberCountryCode", "Country Code"),
    ("numberAreaCode", "Area Code"),
    ("formatE164", "E164 Format"),
    ("formatNational", "National Format"),
    ("formatInternational", "International Format"),
    ("carrier", "Carrier"),
    ("continent", "Continent"),
    ("continentCode", "Continent Code"),
    ("countryName", "Country Name"),
    ("country", "Country"),
    ("region", "Region"),
    ("regionName", "Region Name"),
    ("city", "City"),
    ("zip", "ZIP"),
    ("offset", "Offset"),
    ("currency", "Currency"),
    ("query", DEFAULT_QUERY_LABEL),
];

/// Errors raised when building a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Fewer fields than a status column plus the Query column.
    #[error("schema has {count} field(s); at least {MIN_SCHEMA_FIELDS} are required (status and query)")]
    TooFewFields {
        /// Number of fields provided.
        count: usize,
    },

    /// A field has an empty API name or label.
    #[error("schema field at position {index} has an empty name or label")]
    EmptyField {
        /// Zero-based position of the offending field.
        index: usize,
    },

    /// Two fields share the same output label.
    #[error("duplicate schema label '{label}'")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
}

/// One column of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name requested from the lookup service.
    pub name: String,
    /// Column header written to the output store.
    pub label: String,
}

impl SchemaField {
    /// Creates a schema field.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Ordered, fixed-arity list of fields.
///
/// The last field is the Query column, the resumability key of the output
/// store. A schema is immutable once built; every record produced during a
/// run has exactly [`Schema::len`] fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS
                .iter()
                .map(|(name, label)| SchemaField::new(*name, *label))
                .collect(),
        }
    }
}

impl Schema {
    /// Builds a schema from an ordered field list.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when there are fewer than two fields, a field
    /// is blank, or labels repeat.
    pub fn new(fields: Vec<SchemaField>) -> Result<Self, SchemaError> {
        if fields.len() < MIN_SCHEMA_FIELDS {
            return Err(SchemaError::TooFewFields {
                count: fields.len(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for (index, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() || field.label.trim().is_empty() {
                return Err(SchemaError::EmptyField { index });
            }
            if !seen.insert(field.label.as_str()) {
                return Err(SchemaError::DuplicateLabel {
                    label: field.label.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// Number of fields in every record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a valid schema has at least two fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The ordered fields.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Output column headers in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }

    /// Header of the Query column (the last field).
    #[must_use]
    pub fn query_label(&self) -> &str {
        self.fields
            .last()
            .map_or(DEFAULT_QUERY_LABEL, |f| f.label.as_str())
    }

    /// Comma-joined API field names for the `fields` query parameter.
    #[must_use]
    pub fn api_fields(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether `header` matches the schema labels exactly, after trimming.
    #[must_use]
    pub fn matches_header(&self, header: &[String]) -> bool {
        header.len() == self.fields.len()
            && header
                .iter()
                .zip(self.labels())
                .all(|(actual, expected)| actual.trim() == expected)
    }
}
