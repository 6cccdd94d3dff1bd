//! Column letter resolution ("A", "Z", "AA", ...)

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of columns in a modern spreadsheet (last column is `XFD`)
pub const MAX_COLUMNS: u32 = 16_384;

/// How strictly column tokens are validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPolicy {
    /// Non-alphabetic characters inside a token are ignored
    #[default]
    Lenient,
    /// Whitespace around a token is trimmed; anything else non-alphabetic is an error
    Strict,
}

/// A 0-based column position in a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnIndex(u32);

impl ColumnIndex {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Convert a 1-based spreadsheet column number. This is the only place
    /// where the 1-based numbering meets the 0-based sheet coordinates.
    pub fn from_number(number: u32) -> Option<Self> {
        number.checked_sub(1).map(Self)
    }

    /// 0-based position
    pub fn get(self) -> u32 {
        self.0
    }

    /// 1-based spreadsheet number
    pub fn number(self) -> u32 {
        self.0 + 1
    }

    pub fn letters(self) -> String {
        column_letters(self.0)
    }
}

impl fmt::Display for ColumnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

/// Convert a column token like `"AD"` into its 1-based number (`30`).
///
/// Letters are folded left to right: `num = num * 26 + (letter - 'A' + 1)`.
pub fn column_number(token: &str, policy: ColumnPolicy) -> Result<u32> {
    let candidate = match policy {
        ColumnPolicy::Lenient => token,
        ColumnPolicy::Strict => token.trim(),
    };

    let mut number: u32 = 0;
    let mut letters = 0usize;
    for ch in candidate.chars() {
        if ch.is_ascii_alphabetic() {
            let digit = u32::from(ch.to_ascii_uppercase() as u8 - b'A') + 1;
            number = number * 26 + digit;
            letters += 1;
            if number > MAX_COLUMNS {
                return Err(ConvertError::InvalidColumn {
                    token: token.to_string(),
                    reason: format!(
                        "beyond the last spreadsheet column {}",
                        column_letters(MAX_COLUMNS - 1)
                    ),
                });
            }
        } else if policy == ColumnPolicy::Strict {
            return Err(ConvertError::InvalidColumn {
                token: token.to_string(),
                reason: format!("unexpected character '{ch}'"),
            });
        }
    }

    if letters == 0 {
        return Err(ConvertError::EmptyColumnToken {
            token: token.to_string(),
        });
    }
    Ok(number)
}

/// Resolve one column token straight to its 0-based index
pub fn parse_column(token: &str, policy: ColumnPolicy) -> Result<ColumnIndex> {
    let number = column_number(token, policy)?;
    ColumnIndex::from_number(number).ok_or_else(|| ConvertError::EmptyColumnToken {
        token: token.to_string(),
    })
}

/// Convert a 0-based column index to letters (0 -> A, 27 -> AB)
pub fn column_letters(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// Which columns to export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Every column of the sheet, left to right
    #[default]
    All,
    /// Columns in the order given; repeats are kept
    Explicit(Vec<ColumnIndex>),
}

impl ColumnSelection {
    /// Parse a comma-separated list such as `"A,B,Z,AA"`. `None` selects all columns.
    pub fn parse(spec: Option<&str>, policy: ColumnPolicy) -> Result<Self> {
        match spec {
            None => Ok(ColumnSelection::All),
            Some(list) => list
                .split(',')
                .map(|token| parse_column(token, policy))
                .collect::<Result<Vec<_>>>()
                .map(ColumnSelection::Explicit),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ColumnSelection::All)
    }

    /// Resolve against a sheet that has `column_count` columns
    pub fn resolve(&self, column_count: u32) -> Result<Vec<ColumnIndex>> {
        match self {
            ColumnSelection::All => Ok((0..column_count).map(ColumnIndex).collect()),
            ColumnSelection::Explicit(columns) => {
                if let Some(outside) = columns.iter().find(|c| c.get() >= column_count) {
                    return Err(ConvertError::ColumnOutOfRange {
                        column: outside.letters(),
                        columns: column_count,
                    });
                }
                Ok(columns.clone())
            }
        }
    }
}
