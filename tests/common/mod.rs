#![allow(dead_code)]

use polars::prelude::*;
use tracing_subscriber::EnvFilter;
use ygfews::data::is_numeric_dtype;

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn sample_dataframe() -> DataFrame {
    df!(
        "name" => &["Alice", "Bob", "Charlie", "David", "Eve"],
        "age" => &[25i64, 30, 35, 40, 45],
        "score" => &[85.5, 90.0, 78.5, 92.0, 88.5]
    )
    .expect("valid sample frame")
}

/// Column-by-column comparison that tolerates numeric widening (an integer
/// column read back as floats compares equal).
pub fn assert_frames_match(expected: &DataFrame, actual: &DataFrame) {
    assert_eq!(expected.get_column_names(), actual.get_column_names());
    assert_eq!(expected.height(), actual.height());

    for (left, right) in expected.get_columns().iter().zip(actual.get_columns()) {
        if is_numeric_dtype(left.dtype()) {
            let as_f64 = |c: &Column| -> Vec<Option<f64>> {
                c.cast(&DataType::Float64)
                    .unwrap()
                    .f64()
                    .unwrap()
                    .into_iter()
                    .collect()
            };
            assert_eq!(as_f64(left), as_f64(right), "column {}", left.name());
        } else {
            let as_str = |c: &Column| -> Vec<Option<String>> {
                c.cast(&DataType::String)
                    .unwrap()
                    .str()
                    .unwrap()
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect()
            };
            assert_eq!(as_str(left), as_str(right), "column {}", left.name());
        }
    }
}
