//! Delimited text output with minimal quoting

use crate::error::{ConvertError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Field separator. Always a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter(u8);

impl Delimiter {
    pub const COMMA: Delimiter = Delimiter(b',');

    /// Parse a delimiter argument. `\t` and `tab` stand for a tab character.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ConvertError::InvalidDelimiter {
            delimiter: raw.to_string(),
            reason: reason.to_string(),
        };

        let byte = match raw {
            "\\t" => b'\t',
            other if other.eq_ignore_ascii_case("tab") => b'\t',
            "" => return Err(invalid("delimiter is empty")),
            other => match other.as_bytes() {
                [single] => *single,
                _ => return Err(invalid("delimiter must be a single character")),
            },
        };

        match byte {
            b'"' => Err(invalid("the quote character cannot be the delimiter")),
            b'\r' | b'\n' => Err(invalid("line breaks cannot be the delimiter")),
            _ => Ok(Delimiter(byte)),
        }
    }

    pub fn as_byte(self) -> u8 {
        self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::COMMA
    }
}

impl FromStr for Delimiter {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        Delimiter::parse(s)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            b'\t' => f.write_str("\\t"),
            byte => write!(f, "{}", byte as char),
        }
    }
}

/// Record terminator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    fn terminator(self) -> Terminator {
        match self {
            LineEnding::Lf => Terminator::Any(b'\n'),
            LineEnding::Crlf => Terminator::CRLF,
        }
    }
}

/// Streams records to a destination, one line per record.
///
/// Fields are quoted with `"` only when they contain the delimiter, a quote or
/// a line break; embedded quotes are doubled.
pub struct DelimitedWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl DelimitedWriter<File> {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(
        path: P,
        delimiter: Delimiter,
        line_ending: LineEnding,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ConvertError::CreateOutput {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(file, delimiter, line_ending))
    }
}

impl<W: Write> DelimitedWriter<W> {
    pub fn from_writer(writer: W, delimiter: Delimiter, line_ending: LineEnding) -> Self {
        let inner = WriterBuilder::new()
            .delimiter(delimiter.as_byte())
            .quote(b'"')
            .double_quote(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(line_ending.terminator())
            .from_writer(writer);
        Self { inner }
    }

    pub fn write_record(&mut self, record: &[String]) -> Result<()> {
        self.inner.write_record(record)?;
        Ok(())
    }

    /// Flush buffered records to the destination
    pub fn finish(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the destination
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| ConvertError::Io(e.into_error()))
    }
}
