//! xlsutils-core: first-sheet workbook to delimited text conversion
//!
//! Reads the first sheet of an Excel/ODS workbook through calamine, selects
//! columns by their spreadsheet letters, and streams the rows to a delimited
//! text file with minimal quoting. Numeric cells are written as integers and
//! text cells are transliterated to ASCII.

pub mod columns;
pub mod config;
pub mod converter;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use columns::{ColumnIndex, ColumnPolicy, ColumnSelection};
pub use config::ConverterConfig;
pub use converter::{
    ConversionSummary, ConvertOptions, Converter, DuplicateHeaders, Reporter, SilentReporter,
    StdoutReporter,
};
pub use error::ConvertError;
pub use writer::{Delimiter, DelimitedWriter, LineEnding};
