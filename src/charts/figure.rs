//! Figure Model
//! Inspectable description of a chart, rendered on demand by the
//! static renderer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::renderer::StaticChartRenderer;
use super::ChartError;
use crate::stats::{DensityCurve, HistogramBin};

/// Pixels per figure size unit.
pub const DPI: u32 = 100;

/// Diverging and sequential color scales for heatmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Coolwarm,
    Bwr,
    Viridis,
    Greys,
}

impl Colormap {
    const COOLWARM: &'static [(u8, u8, u8)] = &[
        (59, 76, 192),
        (141, 176, 254),
        (221, 220, 220),
        (244, 154, 123),
        (180, 4, 38),
    ];
    const BWR: &'static [(u8, u8, u8)] = &[(0, 0, 255), (255, 255, 255), (255, 0, 0)];
    const VIRIDIS: &'static [(u8, u8, u8)] = &[
        (68, 1, 84),
        (59, 82, 139),
        (33, 145, 140),
        (94, 201, 98),
        (253, 231, 37),
    ];
    const GREYS: &'static [(u8, u8, u8)] = &[(255, 255, 255), (0, 0, 0)];

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Coolwarm => "coolwarm",
            Colormap::Bwr => "bwr",
            Colormap::Viridis => "viridis",
            Colormap::Greys => "Greys",
        }
    }

    fn anchors(self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::Coolwarm => Self::COOLWARM,
            Colormap::Bwr => Self::BWR,
            Colormap::Viridis => Self::VIRIDIS,
            Colormap::Greys => Self::GREYS,
        }
    }

    /// Color at position `t` in `[0, 1]`, linearly interpolated between
    /// anchor colors. Out-of-range positions are clamped.
    pub fn rgb(self, t: f64) -> (u8, u8, u8) {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (anchors.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(anchors.len() - 2);
        let frac = scaled - lower as f64;

        let (r0, g0, b0) = anchors[lower];
        let (r1, g1, b1) = anchors[lower + 1];
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        (mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }
}

impl FromStr for Colormap {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Colormap::Coolwarm, Colormap::Bwr, Colormap::Viridis, Colormap::Greys]
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ChartError::UnknownColormap(s.to_string()))
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Correlation heatmap contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub labels: Vec<String>,
    /// Row-major square matrix, one row per label.
    pub values: Vec<Vec<f64>>,
    pub colormap: Colormap,
    /// Value mapped to the middle of the colormap.
    pub center: f64,
    /// Decimal places used for cell annotations.
    pub precision: usize,
}

impl Heatmap {
    /// Symmetric color scale limits around `center`.
    pub fn color_limits(&self) -> (f64, f64) {
        let spread = self
            .values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .map(|v| (v - self.center).abs())
            .fold(0.0f64, f64::max);
        let spread = if spread > 0.0 { spread } else { 1.0 };
        (self.center - spread, self.center + spread)
    }

    /// Colormap position of `value` under [`Heatmap::color_limits`].
    pub fn normalize(&self, value: f64) -> f64 {
        let (lo, hi) = self.color_limits();
        (value - lo) / (hi - lo)
    }

    /// Annotation text for a cell; empty for undefined correlations.
    pub fn annotation(&self, value: f64) -> String {
        if value.is_finite() {
            format!("{:.*}", self.precision, value)
        } else {
            String::new()
        }
    }
}

/// What an axes draws.
#[derive(Debug, Clone, PartialEq)]
pub enum AxesContent {
    Distribution {
        bins: Vec<HistogramBin>,
        kde: Option<DensityCurve>,
    },
    Heatmap(Heatmap),
}

/// One plotting area of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub(crate) title: String,
    pub(crate) x_label: String,
    pub(crate) y_label: String,
    pub(crate) grid: bool,
    pub(crate) content: AxesContent,
}

impl Axes {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    pub fn has_grid(&self) -> bool {
        self.grid
    }

    pub fn content(&self) -> &AxesContent {
        &self.content
    }

    /// Legend entries shown on this axes.
    pub fn legend(&self) -> Vec<&str> {
        match &self.content {
            AxesContent::Distribution { kde: Some(_), .. } => vec!["KDE"],
            _ => Vec::new(),
        }
    }
}

/// A renderable chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    size: (u32, u32),
    axes: Vec<Axes>,
}

impl Figure {
    pub(crate) fn new(size: (u32, u32), axes: Vec<Axes>) -> Self {
        Self { size, axes }
    }

    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    /// Size in figure units (width, height).
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Rendered size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.size.0 * DPI, self.size.1 * DPI)
    }

    /// Render to a PNG (or other bitmap format chosen by extension).
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ChartError> {
        StaticChartRenderer::render_bitmap(self, path.as_ref())
    }

    /// Render to an SVG file.
    pub fn save_svg(&self, path: impl AsRef<Path>) -> Result<(), ChartError> {
        let svg = self.to_svg()?;
        std::fs::write(path, svg)?;
        Ok(())
    }

    /// Render to an SVG document in memory.
    pub fn to_svg(&self) -> Result<String, ChartError> {
        StaticChartRenderer::render_svg(self)
    }
}
