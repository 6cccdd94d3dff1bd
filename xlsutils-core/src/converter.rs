//! First sheet to delimited text conversion

use crate::columns::{ColumnIndex, ColumnSelection};
use crate::error::{ConvertError, Result};
use crate::format;
use crate::reader::{self, FirstSheet};
use crate::writer::{Delimiter, DelimitedWriter, LineEnding};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, trace};

/// What to do when two selected columns carry the same header name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateHeaders {
    /// Write the names as they are; every column keeps its own values
    #[default]
    Keep,
    /// Rename later occurrences to `Name_2`, `Name_3`, ...
    Suffix,
    /// Fail before anything is written
    Reject,
}

impl DuplicateHeaders {
    pub fn apply(self, header: Vec<String>) -> Result<Vec<String>> {
        match self {
            DuplicateHeaders::Keep => Ok(header),
            DuplicateHeaders::Reject => {
                let duplicate = {
                    let mut seen = HashSet::new();
                    header.iter().find(|name| !seen.insert(name.as_str())).cloned()
                };
                match duplicate {
                    Some(name) => Err(ConvertError::DuplicateHeader { name }),
                    None => Ok(header),
                }
            }
            DuplicateHeaders::Suffix => {
                let mut used = HashSet::new();
                let mut renamed = Vec::with_capacity(header.len());
                for name in header {
                    let mut candidate = name.clone();
                    let mut occurrence = 1;
                    while !used.insert(candidate.clone()) {
                        occurrence += 1;
                        candidate = format!("{name}_{occurrence}");
                    }
                    renamed.push(candidate);
                }
                Ok(renamed)
            }
        }
    }
}

/// Receives the human-readable progress lines of a conversion
pub trait Reporter {
    fn progress(&mut self, message: &str);
}

/// Prints progress lines to standard output
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn progress(&mut self, message: &str) {
        println!("> {message}");
    }
}

/// Discards progress lines
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn progress(&mut self, _message: &str) {}
}

impl Reporter for Vec<String> {
    fn progress(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub columns: ColumnSelection,
    pub delimiter: Delimiter,
    pub line_ending: LineEnding,
    pub duplicate_headers: DuplicateHeaders,
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub sheet_name: String,
    pub header: Vec<String>,
    pub rows_written: usize,
}

pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert the first sheet of `input` into `output`
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        reporter: &mut dyn Reporter,
    ) -> Result<ConversionSummary> {
        let input = input.as_ref();
        reporter.progress(&format!("Reading workbook '{}'", input.display()));
        let sheet = reader::open_first_sheet(input)?;
        self.convert_sheet(&sheet, output.as_ref(), reporter)
    }

    /// Convert an already loaded sheet into `output`
    pub fn convert_sheet(
        &self,
        sheet: &FirstSheet,
        output: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<ConversionSummary> {
        let (row_count, column_count) = (sheet.row_count(), sheet.column_count());
        reporter.progress(&format!(
            "Reading sheet '{}' ({} rows, {} columns)",
            sheet.name(),
            row_count,
            column_count
        ));
        if sheet.is_empty() {
            return Err(ConvertError::EmptySheet {
                name: sheet.name().to_string(),
            });
        }

        if self.options.columns.is_all() {
            reporter.progress(
                "Columns parameter not specified. Going to obtain data from ALL columns...",
            );
        }
        let columns = self.options.columns.resolve(column_count)?;
        let header = extract_header(sheet, &columns);

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!("List of columns by number:");
            for (column, name) in columns.iter().zip(&header) {
                debug!("{} {} {}", column.number(), column, name);
            }
        }

        let header = self.options.duplicate_headers.apply(header)?;
        reporter.progress(&format!("Header: {}", header.join(",")));

        reporter.progress(&format!("Writing delimited file '{}'", output.display()));
        let mut writer =
            DelimitedWriter::create(output, self.options.delimiter, self.options.line_ending)?;
        writer.write_record(&header)?;
        let rows_written = emit_rows(sheet, &columns, &mut writer)?;
        writer.finish()?;

        reporter.progress(&format!("Wrote {rows_written} data rows"));
        info!(
            sheet = sheet.name(),
            rows = rows_written,
            columns = header.len(),
            "converted sheet to {}",
            output.display()
        );

        Ok(ConversionSummary {
            sheet_name: sheet.name().to_string(),
            header,
            rows_written,
        })
    }
}

/// Header names from row 0, in the order of `columns`
pub fn extract_header(sheet: &FirstSheet, columns: &[ColumnIndex]) -> Vec<String> {
    columns
        .iter()
        .map(|column| format::header_text(&sheet.cell(0, column.get())))
        .collect()
}

/// Write every data row (1..row_count) and return how many were written.
///
/// One record buffer is reused and cleared before each row.
pub fn emit_rows<W: Write>(
    sheet: &FirstSheet,
    columns: &[ColumnIndex],
    writer: &mut DelimitedWriter<W>,
) -> Result<usize> {
    let mut record: Vec<String> = Vec::with_capacity(columns.len());
    let mut written = 0;

    for row in 1..sheet.row_count() {
        record.clear();
        record.extend(
            columns
                .iter()
                .map(|column| format::cell_text(&sheet.cell(row, column.get()))),
        );
        writer.write_record(&record)?;
        trace!(row, "row written");
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnPolicy;
    use calamine::{Data, Range};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn people() -> FirstSheet {
        let mut range = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((0, 1), Data::String("Age".to_string()));
        range.set_value((0, 2), Data::String("City".to_string()));
        range.set_value((1, 0), Data::String("José".to_string()));
        range.set_value((1, 1), Data::Float(34.0));
        range.set_value((1, 2), Data::String("São Paulo".to_string()));
        range.set_value((2, 0), Data::String("Ana".to_string()));
        range.set_value((2, 2), Data::String("Lima".to_string()));
        FirstSheet::new("People", range)
    }

    fn render(sheet: &FirstSheet, columns: &[ColumnIndex]) -> String {
        let mut writer = DelimitedWriter::from_writer(Vec::new(), Delimiter::COMMA, LineEnding::Lf);
        emit_rows(sheet, columns, &mut writer).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_follows_selection_order() {
        let sheet = people();
        let columns = ColumnSelection::parse(Some("C,A,C"), ColumnPolicy::Lenient)
            .unwrap()
            .resolve(sheet.column_count())
            .unwrap();
        assert_eq!(
            extract_header(&sheet, &columns),
            names(&["City", "Name", "City"])
        );
    }

    #[test]
    fn test_rows_are_formatted_per_cell_type() {
        let sheet = people();
        let columns = ColumnSelection::All.resolve(sheet.column_count()).unwrap();
        assert_eq!(render(&sheet, &columns), "Jose,34,Sao Paulo\nAna,,Lima\n");
    }

    #[test]
    fn test_missing_cell_does_not_leak_previous_row() {
        let sheet = people();
        let columns = vec![ColumnIndex::new(1), ColumnIndex::new(2)];
        assert_eq!(render(&sheet, &columns), "34,Sao Paulo\n,Lima\n");
    }

    #[test]
    fn test_header_only_sheet_writes_no_rows() {
        let mut range = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::String("A".to_string()));
        range.set_value((0, 1), Data::String("B".to_string()));
        let sheet = FirstSheet::new("Header", range);
        let columns = ColumnSelection::All.resolve(sheet.column_count()).unwrap();
        assert_eq!(render(&sheet, &columns), "");
    }

    #[test]
    fn test_duplicate_keep() {
        let header = names(&["Name", "Name"]);
        assert_eq!(DuplicateHeaders::Keep.apply(header.clone()).unwrap(), header);
    }

    #[test]
    fn test_duplicate_suffix() {
        let header = names(&["Name", "City", "Name", "Name_2", "Name"]);
        assert_eq!(
            DuplicateHeaders::Suffix.apply(header).unwrap(),
            names(&["Name", "City", "Name_2", "Name_2_2", "Name_3"])
        );
    }

    #[test]
    fn test_duplicate_reject() {
        assert!(DuplicateHeaders::Reject.apply(names(&["A", "B"])).is_ok());
        match DuplicateHeaders::Reject.apply(names(&["A", "B", "A"])) {
            Err(ConvertError::DuplicateHeader { name }) => assert_eq!(name, "A"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_progress_lines() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("people.csv");
        let converter = Converter::new(ConvertOptions::default());
        let mut progress: Vec<String> = Vec::new();
        let summary = converter
            .convert_sheet(&people(), &output, &mut progress)
            .unwrap();

        assert_eq!(summary.rows_written, 2);
        assert_eq!(progress[0], "Reading sheet 'People' (3 rows, 3 columns)");
        assert!(progress[1].starts_with("Columns parameter not specified"));
        assert_eq!(progress[2], "Header: Name,Age,City");
        assert!(progress[3].starts_with("Writing delimited file"));
        assert_eq!(progress[4], "Wrote 2 data rows");
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.csv");
        let sheet = FirstSheet::new("Blank", Range::empty());
        let converter = Converter::new(ConvertOptions::default());
        let err = converter
            .convert_sheet(&sheet, &output, &mut SilentReporter)
            .unwrap_err();
        assert!(matches!(err, ConvertError::EmptySheet { .. }));
        assert!(!output.exists());
    }
}
