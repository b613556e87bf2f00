//! Charts module - figure building and static rendering

mod figure;
mod plotter;
mod renderer;

use polars::prelude::PolarsError;
use thiserror::Error;

pub use figure::{Axes, AxesContent, Colormap, Figure, Heatmap, DPI};
pub use plotter::{ChartPlotter, CorrelationOptions, DistributionOptions};
pub use renderer::StaticChartRenderer;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Number of bins must be positive")]
    InvalidBins,
    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),
    #[error("Failed to render chart: {0}")]
    Render(String),
}
