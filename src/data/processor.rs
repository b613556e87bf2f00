//! Data Processor Module
//! Handles data cleaning: empty row/column removal and deduplication.

use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Handles data cleaning operations.
///
/// Every operation takes the input frame by reference and returns a new
/// frame; the caller's data is never modified.
pub struct DataProcessor;

impl DataProcessor {
    /// Basic cleaning pass.
    ///
    /// Rows whose cells are all missing are dropped first, then columns whose
    /// remaining cells are all missing. With `drop_duplicates`, repeated rows
    /// are then removed keeping the first occurrence. Row order is preserved
    /// and the result is positioned from zero.
    pub fn clean(df: &DataFrame, drop_duplicates: bool) -> Result<DataFrame, ProcessorError> {
        let (rows_in, cols_in) = df.shape();

        let mut cleaned = Self::drop_empty_rows(df)?;
        cleaned = Self::drop_empty_columns(&cleaned)?;
        if drop_duplicates {
            cleaned = Self::drop_duplicate_rows(&cleaned)?;
        }

        debug!(
            rows_in,
            cols_in,
            rows_out = cleaned.height(),
            cols_out = cleaned.width(),
            drop_duplicates,
            "dataset cleaned"
        );
        Ok(cleaned)
    }

    /// Drop rows in which every cell is missing.
    pub fn drop_empty_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
        if df.width() == 0 {
            return Ok(df.clone());
        }

        let mut all_missing = vec![true; df.height()];
        for column in df.get_columns() {
            for (flag, missing) in all_missing.iter_mut().zip(Self::missing_mask(column)?) {
                *flag &= missing;
            }
        }

        if !all_missing.iter().any(|&m| m) {
            return Ok(df.clone());
        }
        let keep: Vec<bool> = all_missing.iter().map(|&m| !m).collect();
        df.filter(&BooleanChunked::from_slice("keep".into(), &keep))
    }

    /// Drop columns in which every cell is missing. A frame without rows
    /// loses all of its columns.
    pub fn drop_empty_columns(df: &DataFrame) -> PolarsResult<DataFrame> {
        let mut kept = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            if !Self::missing_mask(column)?.iter().all(|&m| m) {
                kept.push(column.clone());
            }
        }

        if kept.len() == df.width() {
            return Ok(df.clone());
        }
        DataFrame::new(kept)
    }

    /// Drop rows equal to an earlier row, keeping first occurrences in order.
    pub fn drop_duplicate_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
        let duplicated = Self::duplicated(df)?;
        if !duplicated.iter().any(|&d| d) {
            return Ok(df.clone());
        }
        let keep: Vec<bool> = duplicated.iter().map(|&d| !d).collect();
        df.filter(&BooleanChunked::from_slice("keep".into(), &keep))
    }

    /// For each row, whether an earlier row holds the same values. Missing
    /// cells compare equal to each other.
    pub fn duplicated(df: &DataFrame) -> PolarsResult<Vec<bool>> {
        let mut seen = HashSet::with_capacity(df.height());
        (0..df.height())
            .map(|idx| Ok(!seen.insert(Self::row_key(df, idx)?)))
            .collect()
    }

    /// Per-cell missing flags. Nulls are missing everywhere; NaN is missing
    /// in floating point columns.
    fn missing_mask(column: &Column) -> PolarsResult<Vec<bool>> {
        if matches!(column.dtype(), DataType::Float32 | DataType::Float64) {
            let values = column.cast(&DataType::Float64)?;
            return Ok(values
                .f64()?
                .into_iter()
                .map(|v| v.map_or(true, f64::is_nan))
                .collect());
        }

        let nulls = column.as_materialized_series().is_null();
        Ok(nulls.into_iter().map(|v| v.unwrap_or(true)).collect())
    }

    fn row_key(df: &DataFrame, idx: usize) -> PolarsResult<String> {
        let mut key = String::new();
        for column in df.get_columns() {
            key.push_str(&Self::cell_key(column.get(idx)?));
            key.push('\u{1f}');
        }
        Ok(key)
    }

    /// Hashable form of a cell. NaN folds into null and `-0.0` into `0.0`.
    fn cell_key(value: AnyValue<'_>) -> String {
        match value {
            AnyValue::Float64(v) if v.is_nan() => format!("{:?}", AnyValue::Null),
            AnyValue::Float32(v) if v.is_nan() => format!("{:?}", AnyValue::Null),
            AnyValue::Float64(v) => format!("{:?}", AnyValue::Float64(v + 0.0)),
            AnyValue::Float32(v) => format!("{:?}", AnyValue::Float32(v + 0.0)),
            other => format!("{:?}", other),
        }
    }
}
