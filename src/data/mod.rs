//! Data module - file format dispatch and cleaning

mod excel;
mod format;
mod json;
mod loader;
mod processor;
mod writer;

use polars::prelude::*;

pub use format::{FileFormat, UnsupportedFormatError};
pub use loader::{DataLoader, LoaderError};
pub use processor::{DataProcessor, ProcessorError};
pub use writer::{DataWriter, WriteOptions, WriterError};

/// Whether a column of this type holds plain numbers.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Names of the numeric columns of `df`, in column order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}
