//! Data Loader Module
//! Dispatches dataset reads to the Polars and calamine readers by file format.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::{excel, json};
use super::format::{self, FileFormat, UnsupportedFormatError};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Excel(#[from] calamine::Error),
}

type ReadFn = fn(&Path) -> Result<DataFrame, LoaderError>;

/// Reader dispatch table. Its keys are the readable formats, in the order
/// reported by [`UnsupportedFormatError`].
const READERS: &[(FileFormat, ReadFn)] = &[
    (FileFormat::Csv, DataLoader::read_csv),
    (FileFormat::Json, DataLoader::read_json),
    (FileFormat::Xlsx, DataLoader::read_xlsx),
    (FileFormat::Xls, DataLoader::read_xls),
    (FileFormat::Parquet, DataLoader::read_parquet),
];

/// Loads whole datasets from disk.
pub struct DataLoader;

impl DataLoader {
    /// Load a dataset, inferring the format from the file extension unless
    /// `format` names one explicitly.
    ///
    /// Errors raised by the underlying readers (missing file, malformed
    /// content, unreadable workbook) are returned as-is.
    pub fn load(path: impl AsRef<Path>, format: Option<&str>) -> Result<DataFrame, LoaderError> {
        let path = path.as_ref();
        let requested = format::requested_format(path, format);
        let (format, read) = format::resolve(READERS, &requested)?;

        debug!(path = %path.display(), %format, "loading dataset");
        let df = read(path)?;
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "dataset loaded"
        );

        Ok(df)
    }

    /// Formats accepted by [`DataLoader::load`].
    pub fn supported_formats() -> Vec<&'static str> {
        READERS.iter().map(|(format, _)| format.name()).collect()
    }

    fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;
        Ok(df)
    }

    fn read_json(path: &Path) -> Result<DataFrame, LoaderError> {
        json::read_records(path)
    }

    fn read_xlsx(path: &Path) -> Result<DataFrame, LoaderError> {
        excel::read_workbook(path, FileFormat::Xlsx)
    }

    fn read_xls(path: &Path) -> Result<DataFrame, LoaderError> {
        excel::read_workbook(path, FileFormat::Xls)
    }

    fn read_parquet(path: &Path) -> Result<DataFrame, LoaderError> {
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;
        Ok(df)
    }
}
