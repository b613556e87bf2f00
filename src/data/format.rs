//! File Format Module
//! Closed set of serialization formats and format resolution from paths.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// A requested or inferred format outside a dispatch table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported file format: {format}. Supported formats: {supported:?}")]
pub struct UnsupportedFormatError {
    pub format: String,
    pub supported: Vec<&'static str>,
}

/// Serialization formats known to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Json,
    Xlsx,
    /// Legacy Excel workbook, readable only.
    Xls,
    Parquet,
}

impl FileFormat {
    /// Identifier as it appears in file extensions and explicit overrides.
    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xls => "xls",
            FileFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format name requested for `path`: the explicit override, or the extension
/// exactly as written. A path without an extension yields `""`.
pub fn requested_format(path: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(name) => name.to_string(),
        None => path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Look up `name` in a dispatch table.
///
/// On failure the error lists the table's keys in table order.
pub fn resolve<H: Copy>(
    table: &[(FileFormat, H)],
    name: &str,
) -> Result<(FileFormat, H), UnsupportedFormatError> {
    table
        .iter()
        .find(|(format, _)| format.name() == name)
        .copied()
        .ok_or_else(|| UnsupportedFormatError {
            format: name.to_string(),
            supported: table.iter().map(|(format, _)| format.name()).collect(),
        })
}
