//! Data Writer Module
//! Dispatches dataset writes to format-specific writers, creating parent
//! directories on the way.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::excel::XlsxWriter;
use super::json;
use super::format::{self, FileFormat, UnsupportedFormatError};

#[derive(Error, Debug)]
pub enum WriterError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] ::zip::result::ZipError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Invalid value for writer option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },
}

/// Writer-specific options, passed through untouched by the dispatcher.
///
/// Each writer picks the keys it understands and ignores the rest:
///
/// | key          | writers            | value                                   |
/// |--------------|--------------------|-----------------------------------------|
/// | `index`      | all                | bool, prepend an `index` row-number column |
/// | `header`     | csv, xlsx          | bool, default `true`                    |
/// | `separator`  | csv                | single-byte string                      |
/// | `quote_char` | csv                | single-byte string                      |
/// | `null_value` | csv                | string                                  |
/// | `lines`      | json               | bool, newline-delimited records         |
/// | `compression`| parquet            | `uncompressed`, `snappy`, `gzip`, `lz4`, `zstd`, `brotli` |
/// | `sheet_name` | xlsx               | string, default `Sheet1`                |
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteOptions(BTreeMap<String, Value>);

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn invalid(key: &str, reason: impl Into<String>) -> WriterError {
        WriterError::InvalidOption {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, WriterError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Self::invalid(key, format!("expected a boolean, got {}", other))),
        }
    }

    fn string(&self, key: &str) -> Result<Option<&str>, WriterError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(Self::invalid(key, format!("expected a string, got {}", other))),
        }
    }

    fn byte(&self, key: &str) -> Result<Option<u8>, WriterError> {
        match self.string(key)? {
            None => Ok(None),
            Some(s) if s.len() == 1 => Ok(Some(s.as_bytes()[0])),
            Some(s) => Err(Self::invalid(
                key,
                format!("expected a single-byte character, got {:?}", s),
            )),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for WriteOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

type WriteFn = fn(&DataFrame, &Path, &WriteOptions) -> Result<(), WriterError>;

/// Writer dispatch table. Legacy `xls` workbooks are readable but have no
/// writer.
const WRITERS: &[(FileFormat, WriteFn)] = &[
    (FileFormat::Csv, DataWriter::write_csv),
    (FileFormat::Json, DataWriter::write_json),
    (FileFormat::Xlsx, DataWriter::write_xlsx),
    (FileFormat::Parquet, DataWriter::write_parquet),
];

/// Saves datasets to disk.
pub struct DataWriter;

impl DataWriter {
    /// Save `df` to `path`, inferring the format from the extension unless
    /// `format` names one explicitly.
    ///
    /// Missing parent directories are created before the format is checked.
    /// An existing file at `path` is overwritten.
    pub fn save(
        df: &DataFrame,
        path: impl AsRef<Path>,
        format: Option<&str>,
        options: &WriteOptions,
    ) -> Result<(), WriterError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let requested = format::requested_format(path, format);
        let (format, write) = format::resolve(WRITERS, &requested)?;

        debug!(path = %path.display(), %format, ?options, "saving dataset");
        write(df, path, options)?;
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "dataset saved"
        );

        Ok(())
    }

    /// Formats accepted by [`DataWriter::save`].
    pub fn supported_formats() -> Vec<&'static str> {
        WRITERS.iter().map(|(format, _)| format.name()).collect()
    }

    /// Owned copy of `df`, with a leading row-number column when `index` is set.
    fn prepare(df: &DataFrame, options: &WriteOptions) -> Result<DataFrame, WriterError> {
        if options.bool("index")?.unwrap_or(false) {
            Ok(df.with_row_index("index".into(), None)?)
        } else {
            Ok(df.clone())
        }
    }

    fn write_csv(df: &DataFrame, path: &Path, options: &WriteOptions) -> Result<(), WriterError> {
        let mut df = Self::prepare(df, options)?;
        let mut writer = CsvWriter::new(File::create(path)?)
            .include_header(options.bool("header")?.unwrap_or(true));
        if let Some(separator) = options.byte("separator")? {
            writer = writer.with_separator(separator);
        }
        if let Some(quote) = options.byte("quote_char")? {
            writer = writer.with_quote_char(quote);
        }
        if let Some(null_value) = options.string("null_value")? {
            writer = writer.with_null_value(null_value.to_string());
        }
        writer.finish(&mut df)?;
        Ok(())
    }

    /// Write records orientation: a JSON array of row objects, or one object
    /// per line with `lines`.
    fn write_json(df: &DataFrame, path: &Path, options: &WriteOptions) -> Result<(), WriterError> {
        let mut df = Self::prepare(df, options)?;
        json::write_records(&mut df, path, options.bool("lines")?.unwrap_or(false))
    }

    fn write_xlsx(df: &DataFrame, path: &Path, options: &WriteOptions) -> Result<(), WriterError> {
        let df = Self::prepare(df, options)?;
        let sheet_name = options.string("sheet_name")?.unwrap_or("Sheet1");
        XlsxWriter::create(path)?
            .with_sheet_name(sheet_name)
            .include_header(options.bool("header")?.unwrap_or(true))
            .finish(&df)
    }

    fn write_parquet(df: &DataFrame, path: &Path, options: &WriteOptions) -> Result<(), WriterError> {
        let mut df = Self::prepare(df, options)?;
        let mut writer = ParquetWriter::new(File::create(path)?);
        if let Some(name) = options.string("compression")? {
            writer = writer.with_compression(Self::parquet_compression(name)?);
        }
        writer.finish(&mut df)?;
        Ok(())
    }

    fn parquet_compression(name: &str) -> Result<ParquetCompression, WriterError> {
        let compression = match name {
            "uncompressed" => ParquetCompression::Uncompressed,
            "snappy" => ParquetCompression::Snappy,
            "gzip" => ParquetCompression::Gzip(None),
            "lz4" => ParquetCompression::Lz4Raw,
            "zstd" => ParquetCompression::Zstd(None),
            "brotli" => ParquetCompression::Brotli(None),
            other => {
                return Err(WriteOptions::invalid(
                    "compression",
                    format!("unknown parquet codec {:?}", other),
                ))
            }
        };
        Ok(compression)
    }
}
