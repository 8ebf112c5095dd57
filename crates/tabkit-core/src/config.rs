//! Session and load configuration that downstream crates can serialize/deserialize.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Csv,
}

impl FileType {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            other => Err(Error::Config(format!("unsupported file type '{other}'"))),
        }
    }
}

/// Format options for one load. Defaults match the usual CSV reader
/// defaults: no header, no inference, comma separated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub file_type: FileType,
    pub infer_schema: bool,
    #[serde(alias = "first_row_is_header", alias = "header_present")]
    pub header: bool,
    #[serde(alias = "sep")]
    pub delimiter: char,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            file_type: FileType::Csv,
            infer_schema: false,
            header: false,
            delimiter: ',',
        }
    }
}

impl LoadOptions {
    pub fn csv() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_infer_schema(mut self, infer: bool) -> Self {
        self.infer_schema = infer;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Apply a string-valued reader option (`header`, `inferSchema`,
    /// `sep`/`delimiter`, `format`). Keys are case-insensitive.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.to_ascii_lowercase().as_str() {
            "header" => self.header = parse_flag(key, value)?,
            "inferschema" | "infer_schema" => self.infer_schema = parse_flag(key, value)?,
            "sep" | "delimiter" => self.delimiter = parse_delimiter(value)?,
            "format" | "file_type" => self.file_type = FileType::parse(value)?,
            _ => return Err(Error::Config(format!("unknown load option '{key}'"))),
        }
        Ok(())
    }

    /// Delimiter as the single byte the CSV splitter works on.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )))
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::Config(format!(
            "option '{key}' expects true/false, got '{value}'"
        ))),
    }
}

/// Single-character delimiter; the two-character escape `\t` means tab.
pub fn parse_delimiter(value: &str) -> Result<char> {
    if value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Config(format!(
            "delimiter must be exactly one character, got '{value}'"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rows rendered by `show()` when no count is given.
    pub preview_rows: usize,

    /// Rows per partition for parallel filter/aggregate kernels.
    pub partition_rows: usize,

    /// Local directory that `dbfs:/` locations resolve beneath.
    pub dbfs_root: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_rows: 20,
            partition_rows: 8192,
            dbfs_root: PathBuf::from("/dbfs"),
        }
    }
}

impl SessionConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABKIT_PREVIEW_ROWS`: default preview size
    /// - `TABKIT_PARTITION_ROWS`: rows per parallel partition
    /// - `TABKIT_DBFS_ROOT`: local root for `dbfs:/` locations
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABKIT_PREVIEW_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.preview_rows = v;
            }
        }

        if let Ok(s) = std::env::var("TABKIT_PARTITION_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.partition_rows = v.max(1);
            }
        }

        if let Ok(s) = std::env::var("TABKIT_DBFS_ROOT") {
            cfg.dbfs_root = PathBuf::from(s);
        }

        cfg
    }

    pub fn with_partition_rows(mut self, rows: usize) -> Self {
        self.partition_rows = rows.max(1);
        self
    }

    pub fn with_dbfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dbfs_root = root.into();
        self
    }
}
