//! Stats module - numeric helpers behind the charts

mod calculator;

pub use calculator::{DensityCurve, HistogramBin, StatsCalculator};
