//! Chart Plotter Module
//! Builds distribution and correlation figures from Polars data.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::figure::{Axes, AxesContent, Colormap, Figure, Heatmap};
use super::ChartError;
use crate::data::numeric_columns;
use crate::stats::StatsCalculator;

/// Points at which the density curve is sampled.
const KDE_POINTS: usize = 100;

/// Settings for [`ChartPlotter::plot_distribution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionOptions {
    /// Axes title; `Distribution of {series name}` when unset.
    pub title: Option<String>,
    pub bins: usize,
    /// Figure size (width, height) in inches.
    pub size: (u32, u32),
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            title: None,
            bins: 30,
            size: (10, 6),
        }
    }
}

impl DistributionOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }
}

/// Settings for [`ChartPlotter::plot_correlation_matrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationOptions {
    /// Columns to correlate; every numeric column when unset.
    pub columns: Option<Vec<String>>,
    /// Figure size (width, height) in inches.
    pub size: (u32, u32),
    pub colormap: String,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            columns: None,
            size: (12, 10),
            colormap: "coolwarm".to_string(),
        }
    }
}

impl CorrelationOptions {
    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_colormap(mut self, colormap: impl Into<String>) -> Self {
        self.colormap = colormap.into();
        self
    }
}

/// Creates exploratory figures.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Histogram of a numeric series with a kernel density overlay.
    ///
    /// Missing and non-finite values are dropped first. The density curve is
    /// added only when more than one value remains and the values are not
    /// all equal.
    pub fn plot_distribution(
        series: &Series,
        options: &DistributionOptions,
    ) -> Result<Figure, ChartError> {
        if options.bins == 0 {
            return Err(ChartError::InvalidBins);
        }

        let values = StatsCalculator::finite_values(series)?;
        let bins = StatsCalculator::histogram(&values, options.bins);
        let kde = StatsCalculator::gaussian_kde(&values, KDE_POINTS);

        let title = options
            .title
            .clone()
            .unwrap_or_else(|| Self::default_distribution_title(series));

        debug!(
            series = %series.name(),
            values = values.len(),
            bins = options.bins,
            kde = kde.is_some(),
            "distribution figure built"
        );

        let axes = Axes {
            title,
            x_label: "Value".to_string(),
            y_label: "Density".to_string(),
            grid: true,
            content: AxesContent::Distribution { bins, kde },
        };
        Ok(Figure::new(options.size, vec![axes]))
    }

    fn default_distribution_title(series: &Series) -> String {
        if series.name().is_empty() {
            "Distribution".to_string()
        } else {
            format!("Distribution of {}", series.name())
        }
    }

    /// Heatmap of pairwise Pearson correlations, annotated to two decimals
    /// and colored on a scale centered at zero.
    pub fn plot_correlation_matrix(
        df: &DataFrame,
        options: &CorrelationOptions,
    ) -> Result<Figure, ChartError> {
        let colormap: Colormap = options.colormap.parse()?;
        let columns = match &options.columns {
            Some(columns) => columns.clone(),
            None => numeric_columns(df),
        };

        let values = StatsCalculator::correlation_matrix(df, &columns)?;
        debug!(columns = columns.len(), %colormap, "correlation figure built");

        let axes = Axes {
            title: "Correlation Matrix".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            grid: false,
            content: AxesContent::Heatmap(Heatmap {
                labels: columns,
                values,
                colormap,
                center: 0.0,
                precision: 2,
            }),
        };
        Ok(Figure::new(options.size, vec![axes]))
    }
}
