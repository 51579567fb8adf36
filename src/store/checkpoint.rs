//! The single writer of the output store.

use tracing::{info, instrument};

use super::error::StoreError;
use super::OutputStore;
use crate::record::{LookupRecord, Schema};

/// Owns the append transaction against the output store.
///
/// Every flush is one durable append. If a flush fails, rows from earlier
/// flushes stay in the store untouched and the caller keeps the failed
/// batch in memory.
#[derive(Debug)]
pub struct Checkpointer<S> {
    store: S,
    header: Vec<String>,
    flushes: usize,
    rows_written: usize,
}

impl<S: OutputStore> Checkpointer<S> {
    /// Creates a checkpointer writing `schema`'s labels as the header of a new store.
    #[must_use]
    pub fn new(store: S, schema: &Schema) -> Self {
        Self {
            store,
            header: schema.labels().map(str::to_string).collect(),
            flushes: 0,
            rows_written: 0,
        }
    }

    /// Appends `records` to the store. An empty slice is a no-op.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidthMismatch`] without writing anything if any
    /// record's width differs from the header, or the store's error if the
    /// append fails.
    #[instrument(skip(self, records), fields(store = %self.store.location().display(), rows = records.len()))]
    pub fn flush(&mut self, records: &[LookupRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        if let Some(bad) = records.iter().find(|r| r.len() != self.header.len()) {
            return Err(StoreError::WidthMismatch {
                query: bad.query().to_string(),
                expected: self.header.len(),
                actual: bad.len(),
            });
        }

        self.store.append(&self.header, records)?;
        self.flushes += 1;
        self.rows_written += records.len();

        info!(
            flush = self.flushes,
            total_rows = self.rows_written,
            "checkpoint saved"
        );
        Ok(records.len())
    }

    /// Number of successful non-empty flushes.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Rows appended by this checkpointer.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the checkpointer, returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lookup::Outcome;
    use crate::record::{SchemaField, to_record};
    use crate::store::CsvStore;
    use tempfile::TempDir;

    fn schema(width: usize) -> Schema {
        let mut fields: Vec<SchemaField> = (0..width - 1)
            .map(|i| SchemaField::new(format!("f{i}"), format!("F{i}")))
            .collect();
        fields.push(SchemaField::new("query", "Query"));
        Schema::new(fields).unwrap()
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut checkpointer = Checkpointer::new(CsvStore::new(&path), &schema(3));

        assert_eq!(checkpointer.flush(&[]).unwrap(), 0);
        assert_eq!(checkpointer.flushes(), 0);
        assert!(!path.exists(), "empty flush must not create the store");
    }

    #[test]
    fn test_flush_counts_rows_and_flushes() {
        let dir = TempDir::new().unwrap();
        let s = schema(3);
        let mut checkpointer = Checkpointer::new(CsvStore::new(dir.path().join("out.csv")), &s);
        let records = vec![
            to_record(&Outcome::ApiError(500), "+1", &s),
            to_record(&Outcome::InvalidFormat, "2", &s),
        ];

        assert_eq!(checkpointer.flush(&records).unwrap(), 2);
        assert_eq!(checkpointer.flush(&records[..1]).unwrap(), 1);

        assert_eq!(checkpointer.flushes(), 2);
        assert_eq!(checkpointer.rows_written(), 3);
        let table = checkpointer.store().read_table().unwrap().unwrap();
        assert_eq!(table.headers, ["F0", "F1", "Query"]);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_width_mismatch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut checkpointer = Checkpointer::new(CsvStore::new(&path), &schema(3));
        let wide = to_record(&Outcome::ApiError(500), "+1", &schema(4));

        let err = checkpointer.flush(&[wide]).unwrap_err();

        assert!(matches!(err, StoreError::WidthMismatch { expected: 3, actual: 4, .. }));
        assert!(!path.exists());
    }
}
