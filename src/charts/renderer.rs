//! Static Chart Renderer
//! Draws figures with plotters onto bitmap or SVG backends.
//!
//! Layout:
//! 1. Distribution: bold title, histogram bars with black edges, red KDE line
//!    with legend, light grid, "Value" / "Density" axis descriptions.
//! 2. Correlation: bold title, square annotated cells separated by white
//!    lines, column names on both axes, colorbar on the right.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::path::Path;
use tracing::debug;

use super::figure::{Axes, AxesContent, Figure, Heatmap};
use super::ChartError;
use crate::stats::{DensityCurve, HistogramBin};

type DrawResult = Result<(), Box<dyn Error>>;

const FONT: &str = "sans-serif";
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const KDE_COLOR: RGBColor = RGBColor(214, 39, 40);
const MISSING_CELL: RGBColor = RGBColor(235, 235, 235);

/// Number of swatches drawn in a heatmap colorbar.
const COLORBAR_STEPS: usize = 100;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render into a bitmap file; the image format follows the extension.
    pub fn render_bitmap(figure: &Figure, path: &Path) -> Result<(), ChartError> {
        let root = BitMapBackend::new(path, figure.pixel_size()).into_drawing_area();
        Self::draw_figure(figure, &root).map_err(|e| ChartError::Render(e.to_string()))?;
        debug!(path = %path.display(), "figure rendered");
        Ok(())
    }

    /// Render into an in-memory SVG document.
    pub fn render_svg(figure: &Figure) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, figure.pixel_size()).into_drawing_area();
            Self::draw_figure(figure, &root).map_err(|e| ChartError::Render(e.to_string()))?;
        }
        Ok(svg)
    }

    fn draw_figure<DB>(figure: &Figure, root: &DrawingArea<DB, Shift>) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        // Figures hold one axes each; extra axes are stacked vertically.
        let areas = root.split_evenly((figure.axes().len().max(1), 1));
        for (axes, area) in figure.axes().iter().zip(areas.iter()) {
            match axes.content() {
                AxesContent::Distribution { bins, kde } => {
                    Self::draw_distribution(area, axes, bins, kde.as_ref())?
                }
                AxesContent::Heatmap(heatmap) => Self::draw_heatmap(area, axes, heatmap)?,
            }
        }

        root.present()?;
        Ok(())
    }

    fn title_style(area_height: u32) -> TextStyle<'static> {
        let size = (area_height as f64 * 0.045).clamp(14.0, 28.0);
        TextStyle::from((FONT, size).into_font().style(FontStyle::Bold))
    }

    fn draw_distribution<DB>(
        area: &DrawingArea<DB, Shift>,
        axes: &Axes,
        bins: &[HistogramBin],
        kde: Option<&DensityCurve>,
    ) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let x_min = bins.first().map_or(0.0, |b| b.start);
        let x_max = bins.last().map_or(1.0, |b| b.end);
        let y_peak = bins
            .iter()
            .map(|b| b.density)
            .chain(kde.into_iter().flat_map(|k| k.points.iter().map(|p| p.1)))
            .fold(0.0f64, f64::max);
        let y_max = if y_peak > 0.0 { y_peak * 1.05 } else { 1.0 };

        let (_, height) = area.dim_in_pixel();
        let mut chart = ChartBuilder::on(area)
            .caption(axes.title(), Self::title_style(height))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

        {
            let mut mesh = chart.configure_mesh();
            mesh.x_desc(axes.x_label())
                .y_desc(axes.y_label())
                .axis_desc_style((FONT, 18))
                .label_style((FONT, 14));
            if axes.has_grid() {
                mesh.bold_line_style(BLACK.mix(0.1))
                    .light_line_style(BLACK.mix(0.03));
            } else {
                mesh.disable_mesh();
            }
            mesh.draw()?;
        }

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.density)], BAR_COLOR.mix(0.7).filled())
        }))?;
        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.density)], BLACK.stroke_width(1))
        }))?;

        if let Some(kde) = kde {
            chart
                .draw_series(LineSeries::new(
                    kde.points.iter().copied(),
                    KDE_COLOR.stroke_width(2),
                ))?
                .label("KDE")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], KDE_COLOR.stroke_width(2))
                });

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK.mix(0.3))
                .label_font((FONT, 14))
                .draw()?;
        }

        Ok(())
    }

    fn cell_color(heatmap: &Heatmap, value: f64) -> RGBColor {
        if !value.is_finite() {
            return MISSING_CELL;
        }
        let (r, g, b) = heatmap.colormap.rgb(heatmap.normalize(value));
        RGBColor(r, g, b)
    }

    /// Dark text on light cells, white text on dark ones.
    fn annotation_color(cell: RGBColor) -> RGBColor {
        let RGBColor(r, g, b) = cell;
        let luminance = (0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64) / 255.0;
        if luminance > 0.408 {
            BLACK
        } else {
            WHITE
        }
    }

    fn draw_heatmap<DB>(area: &DrawingArea<DB, Shift>, axes: &Axes, heatmap: &Heatmap) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (width, height) = area.dim_in_pixel();
        let n = heatmap.labels.len() as f64;
        // Room left of and below the cells for the column names, in cell units.
        let gutter = (n * 0.25).max(1.0);

        let titled = area.titled(axes.title(), Self::title_style(height))?;
        let (matrix_area, bar_area) = titled.split_horizontally((width as f64 * 0.85) as i32);

        // Keep cells square by padding the longer side.
        let (mw, mh) = matrix_area.dim_in_pixel();
        let side = mw.min(mh);
        let pad_y = ((mh - side) / 2) as i32;
        let pad_x = ((mw - side) / 2) as i32;
        let matrix_area = matrix_area.margin(pad_y, pad_y, pad_x, pad_x);

        let mut chart = ChartBuilder::on(&matrix_area)
            .margin(10)
            .build_cartesian_2d(-gutter..n, -gutter..n)?;

        let cell_px = side as f64 / (n + gutter);
        let label_style = (FONT, (cell_px * 0.18).clamp(10.0, 16.0))
            .into_font()
            .color(&BLACK);
        for (k, label) in heatmap.labels.iter().enumerate() {
            let center = k as f64 + 0.5;
            chart.draw_series(std::iter::once(Text::new(
                label.clone(),
                (center, -0.1),
                label_style.pos(Pos::new(HPos::Center, VPos::Top)),
            )))?;
            // Row 0 is drawn at the top.
            chart.draw_series(std::iter::once(Text::new(
                label.clone(),
                (-0.1, n - center),
                label_style.pos(Pos::new(HPos::Right, VPos::Center)),
            )))?;
        }

        let annotation_size = (cell_px * 0.2).clamp(10.0, 22.0);
        for (i, row) in heatmap.values.iter().enumerate() {
            let top = n - i as f64;
            for (j, &value) in row.iter().enumerate() {
                let left = j as f64;
                let corners = [(left, top - 1.0), (left + 1.0, top)];
                let fill = Self::cell_color(heatmap, value);
                chart.draw_series(std::iter::once(Rectangle::new(corners, fill.filled())))?;
                chart.draw_series(std::iter::once(Rectangle::new(
                    corners,
                    WHITE.stroke_width(2),
                )))?;

                let text = heatmap.annotation(value);
                if !text.is_empty() {
                    let style = (FONT, annotation_size)
                        .into_font()
                        .color(&Self::annotation_color(fill))
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    chart.draw_series(std::iter::once(Text::new(
                        text,
                        (left + 0.5, top - 0.5),
                        style,
                    )))?;
                }
            }
        }

        Self::draw_colorbar(&bar_area, heatmap)
    }

    fn draw_colorbar<DB>(area: &DrawingArea<DB, Shift>, heatmap: &Heatmap) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (lo, hi) = heatmap.color_limits();
        let (_, height) = area.dim_in_pixel();
        let pad = (height / 10) as i32;
        let area = area.margin(pad, pad, 0, 0);

        let mut bar = ChartBuilder::on(&area)
            .margin(10)
            .y_label_area_size(0)
            .right_y_label_area_size(45)
            .build_cartesian_2d(0f64..1f64, lo..hi)?
            .set_secondary_coord(0f64..1f64, lo..hi);

        bar.configure_mesh().disable_mesh().disable_x_axis().disable_y_axis().draw()?;
        bar.configure_secondary_axes()
            .y_labels(5)
            .label_style((FONT, 12))
            .y_label_formatter(&|v| format!("{:.1}", v))
            .draw()?;

        let step = (hi - lo) / COLORBAR_STEPS as f64;
        bar.draw_series((0..COLORBAR_STEPS).map(|k| {
            let v0 = lo + k as f64 * step;
            let (r, g, b) = heatmap.colormap.rgb(heatmap.normalize(v0 + step / 2.0));
            Rectangle::new([(0.0, v0), (1.0, v0 + step)], RGBColor(r, g, b).filled())
        }))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Colormap;

    #[test]
    fn annotation_contrasts_with_cell() {
        assert_eq!(StaticChartRenderer::annotation_color(RGBColor(180, 4, 38)), WHITE);
        assert_eq!(StaticChartRenderer::annotation_color(RGBColor(221, 220, 220)), BLACK);
    }

    #[test]
    fn undefined_correlation_uses_neutral_fill() {
        let heatmap = Heatmap {
            labels: vec!["a".into()],
            values: vec![vec![f64::NAN]],
            colormap: Colormap::Coolwarm,
            center: 0.0,
            precision: 2,
        };
        assert_eq!(StaticChartRenderer::cell_color(&heatmap, f64::NAN), MISSING_CELL);
        assert_eq!(
            StaticChartRenderer::cell_color(&heatmap, 1.0),
            RGBColor(180, 4, 38)
        );
    }
}
