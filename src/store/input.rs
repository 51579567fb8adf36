//! Reading phone numbers from the input table.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, instrument};

use super::csv_store::read_csv;
use super::error::StoreError;

/// Required column of the input table.
pub const PHONE_NUMBER_COLUMN: &str = "Phone_Number";

/// Reads every cell of `column` from the CSV at `path`, in row order.
///
/// Header names are trimmed before matching; the match is case-sensitive.
/// Cells are read as text, so numbers keep their leading `+` and zeros.
/// Missing cells in short rows come back as empty strings.
///
/// # Errors
///
/// Fails fast, before any lookup is issued: [`StoreError::NotFound`] when
/// the file is absent, [`StoreError::MissingColumn`] when the column is
/// not in the header, and IO/CSV errors when the file is unreadable.
#[instrument(fields(path = %path.display()))]
pub fn read_input(path: &Path, column: &str) -> Result<Vec<String>, StoreError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StoreError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::io(path, e)
        }
    })?;

    let table = read_csv(file, path)?;
    let Some(cells) = table.column(column) else {
        return Err(StoreError::missing_column(path, column, &table.headers));
    };
    let numbers: Vec<String> = cells.into_iter().map(str::to_string).collect();

    info!(rows = numbers.len(), "loaded input file");
    Ok(numbers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_column_as_text() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Name,Phone_Number\nA,+17202764654\nB,007911123456\n");

        let numbers = read_input(&path, PHONE_NUMBER_COLUMN).unwrap();

        assert_eq!(numbers, ["+17202764654", "007911123456"]);
    }

    #[test]
    fn test_header_whitespace_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, " Phone_Number \n+1\n");
        assert_eq!(read_input(&path, PHONE_NUMBER_COLUMN).unwrap(), ["+1"]);
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "phone_number\n+1\n");
        let err = read_input(&path, PHONE_NUMBER_COLUMN).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { .. }));
    }

    #[test]
    fn test_missing_cells_are_blank() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Name,Phone_Number\nA\nB,+1\n");
        assert_eq!(read_input(&path, PHONE_NUMBER_COLUMN).unwrap(), ["", "+1"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_input(&dir.path().join("nope.csv"), PHONE_NUMBER_COLUMN).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
