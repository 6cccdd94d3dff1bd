//! Error type shared by the conversion pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the converter can report. All of them abort the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not open workbook '{}': {reason}", path.display())]
    OpenWorkbook { path: PathBuf, reason: String },

    #[error("sheet '{name}' has no header row")]
    EmptySheet { name: String },

    #[error("invalid column '{token}': {reason}")]
    InvalidColumn { token: String, reason: String },

    #[error("column token '{token}' contains no letters")]
    EmptyColumnToken { token: String },

    #[error("column {column} is outside the sheet, which has {columns} columns")]
    ColumnOutOfRange { column: String, columns: u32 },

    #[error("invalid delimiter '{delimiter}': {reason}")]
    InvalidDelimiter { delimiter: String, reason: String },

    #[error("duplicate header name '{name}'")]
    DuplicateHeader { name: String },

    #[error("could not create output file '{}': {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Write(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration in '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl ConvertError {
    /// Process exit status for this error: 2 when the workbook could not be
    /// opened, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::OpenWorkbook { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let open = ConvertError::OpenWorkbook {
            path: PathBuf::from("missing.xlsx"),
            reason: "not found".to_string(),
        };
        assert_eq!(open.exit_code(), 2);

        let dup = ConvertError::DuplicateHeader {
            name: "Name".to_string(),
        };
        assert_eq!(dup.exit_code(), 1);
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConvertError::ColumnOutOfRange {
            column: "Z".to_string(),
            columns: 3,
        };
        assert_eq!(
            err.to_string(),
            "column Z is outside the sheet, which has 3 columns"
        );
    }
}
