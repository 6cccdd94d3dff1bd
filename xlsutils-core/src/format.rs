//! Cell value to text coercion

use crate::reader::CellValue;
use calamine::ExcelDateTime;
use chrono::NaiveTime;

/// Text written to the output for a data cell.
///
/// Numbers are truncated to an integer, text is transliterated to ASCII.
pub fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => integer_text(*n),
        CellValue::Text(s) => transliterate(s),
        CellValue::Empty => String::new(),
        CellValue::Boolean(b) => bool_text(*b).to_string(),
        CellValue::DateTime(dt) => datetime_text(dt),
        CellValue::Error(e) => e.clone(),
    }
}

/// Text written to the header line. Header names are kept as they are.
pub fn header_text(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => integer_text(*n),
        CellValue::Text(s) => s.clone(),
        CellValue::Empty => String::new(),
        CellValue::Boolean(b) => bool_text(*b).to_string(),
        CellValue::DateTime(dt) => datetime_text(dt),
        CellValue::Error(e) => e.clone(),
    }
}

/// Integer part of a number (truncation toward zero)
pub fn integer_text(value: f64) -> String {
    let whole = value.trunc();
    if whole == 0.0 {
        // also covers -0.0
        return "0".to_string();
    }
    format!("{:.0}", whole)
}

/// Closest ASCII approximation of `text`; characters without one are dropped
pub fn transliterate(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    deunicode::deunicode_with_tofu(text, "")
}

fn bool_text(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

fn datetime_text(dt: &ExcelDateTime) -> String {
    if !dt.is_duration() {
        if let Some(datetime) = dt.as_datetime() {
            return if datetime.time() == NaiveTime::MIN {
                datetime.date().to_string()
            } else {
                datetime.to_string()
            };
        }
    }
    dt.as_f64().to_string()
}
