//! Excel/ODS file reader using calamine

use crate::error::{ConvertError, Result};
use calamine::{Reader, open_workbook_auto};
use std::path::Path;

pub mod sheet;

pub use sheet::{CellValue, FirstSheet};

/// Open a workbook (xls, xlsx, xlsb or ods) and load its first sheet
pub fn open_first_sheet<P: AsRef<Path>>(path: P) -> Result<FirstSheet> {
    let path = path.as_ref();
    let open_error = |reason: String| ConvertError::OpenWorkbook {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| open_error(e.to_string()))?;

    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| open_error("workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| open_error(format!("sheet '{}' could not be found", name)))?
        .map_err(|e| open_error(e.to_string()))?;

    tracing::debug!(sheet = %name, "opened first sheet of {}", path.display());
    Ok(FirstSheet::new(name, range))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_open_error() {
        let err = open_first_sheet("does/not/exist.xlsx").unwrap_err();
        assert!(matches!(err, ConvertError::OpenWorkbook { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unknown_extension_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not a workbook").unwrap();
        assert!(matches!(
            open_first_sheet(&path),
            Err(ConvertError::OpenWorkbook { .. })
        ));
    }
}
