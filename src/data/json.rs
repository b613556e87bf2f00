//! JSON Table Module
//! Records-orientation JSON through Polars, plus a column-list form for
//! frames without rows so their schema survives a round trip.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use super::loader::LoaderError;
use super::writer::WriterError;

/// Zero-row table: `{"columns": [..], "dtypes": [..], "data": []}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyTable {
    columns: Vec<String>,
    dtypes: Vec<String>,
    data: Vec<Value>,
}

impl EmptyTable {
    fn from_frame(df: &DataFrame) -> Self {
        Self {
            columns: df.get_column_names().iter().map(|n| n.to_string()).collect(),
            dtypes: df.dtypes().iter().map(|d| dtype_name(d).to_string()).collect(),
            data: Vec::new(),
        }
    }

    fn into_frame(self) -> PolarsResult<DataFrame> {
        let dtypes = self.dtypes.iter().map(String::as_str).chain(std::iter::repeat("null"));
        let columns = self
            .columns
            .iter()
            .zip(dtypes)
            .map(|(name, dtype)| {
                Column::from(Series::new_empty(name.as_str().into(), &dtype_from_name(dtype)))
            })
            .collect();
        DataFrame::new(columns)
    }
}

fn dtype_name(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Boolean => "bool",
        DataType::Int8 => "i8",
        DataType::Int16 => "i16",
        DataType::Int32 => "i32",
        DataType::Int64 => "i64",
        DataType::UInt8 => "u8",
        DataType::UInt16 => "u16",
        DataType::UInt32 => "u32",
        DataType::UInt64 => "u64",
        DataType::Float32 => "f32",
        DataType::Float64 => "f64",
        DataType::String => "str",
        _ => "null",
    }
}

fn dtype_from_name(name: &str) -> DataType {
    match name {
        "bool" => DataType::Boolean,
        "i8" => DataType::Int8,
        "i16" => DataType::Int16,
        "i32" => DataType::Int32,
        "i64" => DataType::Int64,
        "u8" => DataType::UInt8,
        "u16" => DataType::UInt16,
        "u32" => DataType::UInt32,
        "u64" => DataType::UInt64,
        "f32" => DataType::Float32,
        "f64" => DataType::Float64,
        "str" => DataType::String,
        _ => DataType::Null,
    }
}

/// Column-list form, when `bytes` hold one with no data rows.
fn parse_empty_table(bytes: &[u8]) -> Option<EmptyTable> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }
    serde_json::from_slice::<EmptyTable>(bytes)
        .ok()
        .filter(|table| table.data.is_empty())
}

/// Read a JSON array of records, or the column-list form of an empty table.
pub(crate) fn read_records(path: &Path) -> Result<DataFrame, LoaderError> {
    let bytes = fs::read(path)?;
    if let Some(table) = parse_empty_table(&bytes) {
        return Ok(table.into_frame()?);
    }

    let df = JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::Json)
        .finish()?;
    Ok(df)
}

/// Write `df` as a JSON array of records, or one record per line with
/// `lines`. A frame with columns but no rows is written in column-list form
/// unless `lines` is set.
pub(crate) fn write_records(
    df: &mut DataFrame,
    path: &Path,
    lines: bool,
) -> Result<(), WriterError> {
    if !lines && df.height() == 0 && df.width() > 0 {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut out, &EmptyTable::from_frame(df))?;
        out.flush()?;
        return Ok(());
    }

    let json_format = if lines {
        JsonFormat::JsonLines
    } else {
        JsonFormat::Json
    };
    JsonWriter::new(File::create(path)?)
        .with_json_format(json_format)
        .finish(df)?;
    Ok(())
}
