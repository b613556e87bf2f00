//! YGfews - Tabular Data Helpers
//!
//! Load and save DataFrames in CSV, JSON, Excel and Parquet form, apply a
//! basic cleaning pass, and draw two exploratory charts: a distribution
//! histogram with a density curve and a correlation heatmap.
//!
//! ```no_run
//! use ygfews::{clean_data, load_data, save_data, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let df = load_data("data/raw/dataset.csv", None)?;
//! let cleaned = clean_data(&df, true)?;
//! save_data(&cleaned, "data/processed/clean.parquet", None, &WriteOptions::new())?;
//! # Ok(())
//! # }
//! ```

pub mod charts;
pub mod data;
pub mod stats;

use polars::prelude::{DataFrame, Series};
use std::path::Path;

pub use charts::{ChartError, CorrelationOptions, DistributionOptions, Figure};
pub use data::{
    FileFormat, LoaderError, ProcessorError, UnsupportedFormatError, WriteOptions, WriterError,
};

/// Load a dataset, inferring the format from the extension when
/// `file_format` is `None`. See [`data::DataLoader::load`].
pub fn load_data(
    path: impl AsRef<Path>,
    file_format: Option<&str>,
) -> Result<DataFrame, LoaderError> {
    data::DataLoader::load(path, file_format)
}

/// Save a dataset, creating parent directories. See [`data::DataWriter::save`].
pub fn save_data(
    df: &DataFrame,
    path: impl AsRef<Path>,
    file_format: Option<&str>,
    options: &WriteOptions,
) -> Result<(), WriterError> {
    data::DataWriter::save(df, path, file_format, options)
}

/// Drop empty rows and columns, and optionally duplicate rows.
/// See [`data::DataProcessor::clean`].
pub fn clean_data(df: &DataFrame, drop_duplicates: bool) -> Result<DataFrame, ProcessorError> {
    data::DataProcessor::clean(df, drop_duplicates)
}

/// Histogram with density overlay. See [`charts::ChartPlotter::plot_distribution`].
pub fn plot_distribution(
    series: &Series,
    options: &DistributionOptions,
) -> Result<Figure, ChartError> {
    charts::ChartPlotter::plot_distribution(series, options)
}

/// Correlation heatmap. See [`charts::ChartPlotter::plot_correlation_matrix`].
pub fn plot_correlation_matrix(
    df: &DataFrame,
    options: &CorrelationOptions,
) -> Result<Figure, ChartError> {
    charts::ChartPlotter::plot_correlation_matrix(df, options)
}
