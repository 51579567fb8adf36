//! CSV-backed output store.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use super::error::StoreError;
use super::{OutputStore, Table};
use crate::record::LookupRecord;

/// Output store backed by a single CSV file.
///
/// Appends are durable once [`OutputStore::append`] returns: the batch is
/// serialized in memory, written with one `write_all`, then `fsync`ed.
/// Only one process may write a given file at a time; no file locking is
/// performed.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Creates a store for `path`. The file is not touched until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputStore for CsvStore {
    fn location(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn read_table(&self) -> Result<Option<Table>, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("output store does not exist");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let len = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len();
        if len == 0 {
            debug!("output store is zero-length");
            return Ok(None);
        }

        let ends_cleanly =
            ends_with_newline(&mut file).map_err(|e| StoreError::io(&self.path, e))?;
        file.rewind().map_err(|e| StoreError::io(&self.path, e))?;

        let parsed = parse_csv(&file, &self.path)?;
        if !ends_cleanly || parsed.last_row_width_differs() {
            warn!(
                valid_bytes = parsed.last_start,
                "output store ends with an incomplete row"
            );
            return Err(StoreError::torn_tail(&self.path, parsed.last_start));
        }
        debug!(rows = parsed.table.rows.len(), "read output store");
        Ok(Some(parsed.table))
    }

    #[instrument(skip(self, header, records), fields(path = %self.path.display(), rows = records.len()))]
    fn append(&mut self, header: &[String], records: &[LookupRecord]) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let existing_len = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len();

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        if existing_len == 0 {
            debug!("writing header to new output store");
            writer
                .write_record(header)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        for record in records {
            writer
                .write_record(record.fields())
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::io(&self.path, e.into_error()))?;

        // Appending after a torn row would land inside it.
        if existing_len > 0
            && !ends_with_newline(&mut file).map_err(|e| StoreError::io(&self.path, e))?
        {
            file.rewind().map_err(|e| StoreError::io(&self.path, e))?;
            let parsed = parse_csv(&file, &self.path)?;
            return Err(StoreError::torn_tail(&self.path, parsed.last_start));
        }

        file.write_all(&bytes)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.sync_data()
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

/// Parses a headed CSV stream. Rows shorter than the header are padded with
/// empty cells; longer rows are kept as-is.
pub(super) fn read_csv<R: Read>(reader: R, path: &Path) -> Result<Table, StoreError> {
    parse_csv(reader, path).map(|parsed| parsed.table)
}

struct ParsedCsv {
    table: Table,
    /// Byte offset where the last record (or the header, if there are no rows) starts.
    last_start: u64,
    /// Field count of the last record before padding.
    last_width: Option<usize>,
}

impl ParsedCsv {
    fn last_row_width_differs(&self) -> bool {
        self.last_width
            .is_some_and(|width| width != self.table.headers.len())
    }
}

fn parse_csv<R: Read>(reader: R, path: &Path) -> Result<ParsedCsv, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StoreError::csv(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut last_start = 0;
    let mut last_width = None;
    let mut record = csv::StringRecord::new();
    loop {
        let start = reader.position().byte();
        if !reader
            .read_record(&mut record)
            .map_err(|e| StoreError::csv(path, e))?
        {
            break;
        }
        last_start = start;
        last_width = Some(record.len());
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }

    Ok(ParsedCsv {
        table: Table { headers, rows },
        last_start,
        last_width,
    })
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
