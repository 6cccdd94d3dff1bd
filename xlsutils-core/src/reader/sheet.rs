//! First-sheet data structures

use calamine::{Data, ExcelDateTime, Range};

/// The first sheet of a workbook, addressed with absolute 0-based coordinates
#[derive(Debug, Clone)]
pub struct FirstSheet {
    name: String,
    range: Range<Data>,
}

impl FirstSheet {
    pub fn new(name: impl Into<String>, range: Range<Data>) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows, counted from row 0 to the last used row
    pub fn row_count(&self) -> u32 {
        self.range.end().map_or(0, |(row, _)| row + 1)
    }

    /// Number of columns, counted from column 0 to the last used column
    pub fn column_count(&self) -> u32 {
        self.range.end().map_or(0, |(_, col)| col + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }

    /// Cell at an absolute position; positions outside the used range are empty
    pub fn cell(&self, row: u32, col: u32) -> CellValue {
        self.range
            .get_value((row, col))
            .map(CellValue::from)
            .unwrap_or(CellValue::Empty)
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(ExcelDateTime),
    Error(String),
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::Empty => CellValue::Empty,
            Data::DateTime(dt) => CellValue::DateTime(dt.clone()),
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}
