mod common;

use anyhow::Result;
use common::init_tracing;
use polars::prelude::*;
use tempfile::TempDir;
use ygfews::charts::AxesContent;
use ygfews::{plot_correlation_matrix, plot_distribution, ChartError, CorrelationOptions, DistributionOptions};

fn test_series() -> Series {
    let values: Vec<f64> = (0..1000)
        .map(|i| 100.0 + 15.0 * (i as f64 * 0.37).sin())
        .collect();
    Series::new("test_data".into(), values)
}

fn test_dataframe() -> DataFrame {
    let age: Vec<i64> = (0..100).map(|i| 20 + (i * 7) % 45).collect();
    let income: Vec<f64> = age
        .iter()
        .enumerate()
        .map(|(i, &a)| 1500.0 * a as f64 + 4000.0 * (i as f64 * 0.91).cos())
        .collect();
    let score: Vec<f64> = (0..100).map(|i| 70.0 + 10.0 * (i as f64 * 1.3).sin()).collect();
    df!("age" => age, "income" => income, "score" => score).expect("valid frame")
}

#[test]
fn plot_distribution_returns_figure() -> Result<()> {
    init_tracing();
    let fig = plot_distribution(&test_series(), &DistributionOptions::default())?;

    assert_eq!(fig.axes().len(), 1);
    let axes = &fig.axes()[0];
    assert_eq!(axes.title(), "Distribution of test_data");
    assert_eq!(axes.x_label(), "Value");
    assert_eq!(axes.y_label(), "Density");
    assert!(axes.has_grid());
    assert_eq!(axes.legend(), vec!["KDE"]);
    Ok(())
}

#[test]
fn plot_distribution_custom_title() -> Result<()> {
    let options = DistributionOptions::default().with_title("Custom Title");
    let fig = plot_distribution(&test_series(), &options)?;

    assert_eq!(fig.axes()[0].title(), "Custom Title");
    Ok(())
}

#[test]
fn distribution_histogram_is_a_density() -> Result<()> {
    let options = DistributionOptions::default().with_bins(20).with_size(8, 4);
    let fig = plot_distribution(&test_series(), &options)?;
    assert_eq!(fig.size(), (8, 4));
    assert_eq!(fig.pixel_size(), (800, 400));

    match fig.axes()[0].content() {
        AxesContent::Distribution { bins, kde } => {
            assert_eq!(bins.len(), 20);
            assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1000);
            let area: f64 = bins.iter().map(|b| b.density * (b.end - b.start)).sum();
            assert!((area - 1.0).abs() < 1e-9);
            assert!(kde.as_ref().is_some_and(|k| k.bandwidth > 0.0));
        }
        other => panic!("expected a distribution, got {other:?}"),
    }
    Ok(())
}

#[test]
fn distribution_ignores_missing_values() -> Result<()> {
    let series = Series::new("sparse".into(), &[Some(1.0), None, Some(2.0), None, Some(4.0)]);
    let fig = plot_distribution(&series, &DistributionOptions::default().with_bins(3))?;

    match fig.axes()[0].content() {
        AxesContent::Distribution { bins, .. } => {
            assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        }
        other => panic!("expected a distribution, got {other:?}"),
    }
    Ok(())
}

#[test]
fn plot_correlation_matrix_returns_figure() -> Result<()> {
    let fig = plot_correlation_matrix(&test_dataframe(), &CorrelationOptions::default())?;
    assert_eq!(fig.size(), (12, 10));

    let axes = &fig.axes()[0];
    assert_eq!(axes.title(), "Correlation Matrix");
    match axes.content() {
        AxesContent::Heatmap(heatmap) => {
            assert_eq!(heatmap.labels, vec!["age", "income", "score"]);
            for (i, row) in heatmap.values.iter().enumerate() {
                assert!((row[i] - 1.0).abs() < 1e-12);
                for (j, value) in row.iter().enumerate() {
                    assert_eq!(*value, heatmap.values[j][i]);
                    assert!((-1.0..=1.0).contains(value));
                }
            }
            assert!(heatmap.values[0][1] > 0.9);
        }
        other => panic!("expected a heatmap, got {other:?}"),
    }
    Ok(())
}

#[test]
fn plot_correlation_matrix_selected_columns() -> Result<()> {
    let options = CorrelationOptions::default().with_columns(["age", "income"]);
    let fig = plot_correlation_matrix(&test_dataframe(), &options)?;

    match fig.axes()[0].content() {
        AxesContent::Heatmap(heatmap) => {
            assert_eq!(heatmap.labels, vec!["age", "income"]);
            assert_eq!(heatmap.values.len(), 2);
            assert!(heatmap.values.iter().all(|row| row.len() == 2));
        }
        other => panic!("expected a heatmap, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_colormap_is_rejected() {
    let options = CorrelationOptions::default().with_colormap("rainbow-ish");
    assert!(matches!(
        plot_correlation_matrix(&test_dataframe(), &options),
        Err(ChartError::UnknownColormap(_))
    ));
}

#[test]
#[ignore = "needs system fonts"]
fn figures_render_to_png_and_svg() -> Result<()> {
    init_tracing();
    let dir = TempDir::new()?;

    let distribution = plot_distribution(&test_series(), &DistributionOptions::default())?;
    let png = dir.path().join("distribution.png");
    distribution.save_png(&png)?;
    assert!(png.metadata()?.len() > 0);

    let correlation = plot_correlation_matrix(&test_dataframe(), &CorrelationOptions::default())?;
    let svg = dir.path().join("correlation.svg");
    correlation.save_svg(&svg)?;
    let text = std::fs::read_to_string(&svg)?;
    assert!(text.contains("<svg"));
    assert!(text.contains("Correlation Matrix"));
    Ok(())
}

#[test]
fn distribution_skips_infinite_values() -> Result<()> {
    let series = Series::new("spiky".into(), &[1.0, 2.0, f64::INFINITY, f64::NEG_INFINITY]);
    let fig = plot_distribution(&series, &DistributionOptions::default().with_bins(4))?;

    match fig.axes()[0].content() {
        AxesContent::Distribution { bins, kde } => {
            assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
            assert_eq!(bins[0].start, 1.0);
            assert_eq!(bins[3].end, 2.0);
            assert!(bins.iter().all(|b| b.start.is_finite() && b.density.is_finite()));
            assert!(kde.as_ref().is_some_and(|k| k.points.iter().all(|p| p.1.is_finite())));
        }
        other => panic!("expected a distribution, got {other:?}"),
    }
    Ok(())
}
