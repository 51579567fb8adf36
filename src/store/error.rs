//! Error types for the tabular input and output stores.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or appending to a tabular store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The input file does not exist.
    #[error("input file not found: {path}\n  Suggestion: Check the --input path")]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// File system failure (open, write, fsync).
    #[error("IO error accessing {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed or serialized as CSV.
    #[error("malformed table {path}: {source}")]
    Csv {
        /// File being accessed.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("required column '{column}' is missing from {path}\n  Available columns: {available}")]
    MissingColumn {
        /// File being read.
        path: PathBuf,
        /// Column that was required.
        column: String,
        /// Comma-joined list of the header names that were found.
        available: String,
    },

    /// An existing output store was written with a different schema.
    #[error(
        "header of {path} does not match the configured schema\n  Expected: {expected}\n  Found: {found}\n  Suggestion: Use a new --output file or the matching field list"
    )]
    SchemaMismatch {
        /// Output store path.
        path: PathBuf,
        /// Comma-joined expected labels.
        expected: String,
        /// Comma-joined labels found in the store.
        found: String,
    },

    /// The output store ends in a row that was only partly written.
    #[error(
        "{path} ends with an incomplete row after byte {valid_bytes}\n  Suggestion: Truncate the file to its first {valid_bytes} bytes (or delete its last line) and run again"
    )]
    TornTail {
        /// Output store path.
        path: PathBuf,
        /// Length of the prefix that holds only complete rows.
        valid_bytes: u64,
    },

    /// A record's width disagrees with the store's header.
    #[error("record for '{query}' has {actual} fields, expected {expected}")]
    WidthMismatch {
        /// Query value of the offending record.
        query: String,
        /// Header width.
        expected: usize,
        /// Record width.
        actual: usize,
    },
}

impl StoreError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a CSV error.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Creates a torn-tail error for a store whose complete rows end at `valid_bytes`.
    pub fn torn_tail(path: impl Into<PathBuf>, valid_bytes: u64) -> Self {
        Self::TornTail {
            path: path.into(),
            valid_bytes,
        }
    }

    /// Creates a missing-column error listing the columns that were found.
    pub fn missing_column(
        path: impl Into<PathBuf>,
        column: impl Into<String>,
        available: &[String],
    ) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
            available: available.join(", "),
        }
    }
}
