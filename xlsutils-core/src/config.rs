//! Configuration file for the converter

use crate::columns::ColumnPolicy;
use crate::converter::DuplicateHeaders;
use crate::error::{ConvertError, Result};
use crate::writer::LineEnding;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "xls2csv.toml";

/// Main converter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default)]
    pub convert: ConvertSection,
}

/// `[convert]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertSection {
    /// Reject column tokens containing non-letters instead of ignoring them
    #[serde(default)]
    pub strict_columns: bool,
    #[serde(default)]
    pub duplicate_headers: DuplicateHeaders,
    /// Terminate records with `\r\n` instead of `\n`
    #[serde(default)]
    pub crlf: bool,
}

impl ConverterConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |reason: String| ConvertError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        toml::from_str(&content).map_err(|e| config_error(e.to_string()))
    }

    /// Load `explicit` if given, otherwise `xls2csv.toml` from the working
    /// directory if it exists, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn column_policy(&self) -> ColumnPolicy {
        if self.convert.strict_columns {
            ColumnPolicy::Strict
        } else {
            ColumnPolicy::Lenient
        }
    }

    pub fn line_ending(&self) -> LineEnding {
        if self.convert.crlf {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }
}
