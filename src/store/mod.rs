//! Tabular persistence: input reading, progress loading, and checkpointing.
//!
//! The output store is append-only. [`Checkpointer`] is its only writer;
//! [`load_progress`] reads it once at run start to build the skip-list.
//!
//! Running two processes against the same output file is unsupported: no
//! locking is performed and interleaved appends may duplicate lookups.

mod checkpoint;
mod csv_store;
mod error;
mod input;
mod progress;

pub use checkpoint::Checkpointer;
pub use csv_store::CsvStore;
pub use error::StoreError;
pub use input::{PHONE_NUMBER_COLUMN, read_input};
pub use progress::{ProgressLoad, ProgressSet, ProgressStatus, ResumePolicy, load_progress};

use std::path::Path;

use crate::record::LookupRecord;

/// A headed table read back from a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Header cells, whitespace-trimmed.
    pub headers: Vec<String>,
    /// Data rows; each at least `headers.len()` cells wide.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the column whose header equals `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of the named column, in row order.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", String::as_str))
                .collect(),
        )
    }
}

/// Persistent, append-only home of lookup records.
///
/// Implementations must make `append` all-or-nothing from the reader's
/// point of view: after it returns `Ok`, the rows are durable; after `Err`,
/// previously appended rows are untouched.
pub trait OutputStore {
    /// Human-readable location used in logs and errors.
    fn location(&self) -> &Path;

    /// Reads the whole table, or `None` when the store is absent or zero-length.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store exists but cannot be read.
    fn read_table(&self) -> Result<Option<Table>, StoreError>;

    /// Appends `records`, writing `header` first if the store is absent or
    /// zero-length.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append cannot be made durable.
    fn append(&mut self, header: &[String], records: &[LookupRecord]) -> Result<(), StoreError>;
}

impl<S: OutputStore + ?Sized> OutputStore for &mut S {
    fn location(&self) -> &Path {
        (**self).location()
    }

    fn read_table(&self) -> Result<Option<Table>, StoreError> {
        (**self).read_table()
    }

    fn append(&mut self, header: &[String], records: &[LookupRecord]) -> Result<(), StoreError> {
        (**self).append(header, records)
    }
}
