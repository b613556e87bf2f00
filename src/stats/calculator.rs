//! Statistics Calculator Module
//! Histogram binning, Gaussian kernel density estimation and pairwise
//! Pearson correlation for the exploratory plots.

use polars::prelude::*;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

/// One histogram bin over `[start, end)`; the last bin is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
    /// Count normalized so that the histogram integrates to one.
    pub density: f64,
}

/// Sampled kernel density estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub points: Vec<(f64, f64)>,
}

/// Handles statistical calculations for the chart layer.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Finite values of a series as `f64`. Nulls, NaN and infinities are
    /// dropped.
    pub fn finite_values(series: &Series) -> PolarsResult<Vec<f64>> {
        let values = series.strict_cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect())
    }

    /// Smallest and largest value, or `None` for an empty slice.
    pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
    }

    /// Equal-width, density-normalized histogram.
    ///
    /// Bins span `[min, max]`; a constant sample spans `[v - 0.5, v + 0.5]`
    /// and an empty one `[0, 1]`. `bins` must be positive.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        if bins == 0 {
            return Vec::new();
        }

        let (lo, hi) = match Self::value_range(values) {
            None => (0.0, 1.0),
            Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
            Some(range) => range,
        };
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let total = values.len() as f64;
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: lo + i as f64 * width,
                end: if i + 1 == bins { hi } else { lo + (i + 1) as f64 * width },
                count,
                density: if total > 0.0 {
                    count as f64 / (total * width)
                } else {
                    0.0
                },
            })
            .collect()
    }

    /// `n` evenly spaced points from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (end - start) / (n - 1) as f64;
                (0..n).map(|i| start + i as f64 * step).collect()
            }
        }
    }

    /// Gaussian KDE with Scott's rule bandwidth, sampled at `n_points` over
    /// the data range.
    ///
    /// Returns `None` for fewer than two values or a sample without spread,
    /// where the bandwidth would be zero.
    pub fn gaussian_kde(values: &[f64], n_points: usize) -> Option<DensityCurve> {
        if values.len() < 2 {
            return None;
        }

        let std = values.std_dev();
        let bandwidth = std * (values.len() as f64).powf(-0.2);
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return None;
        }

        let (lo, hi) = Self::value_range(values)?;
        let kernels: Vec<Normal> = values
            .iter()
            .filter_map(|&v| Normal::new(v, bandwidth).ok())
            .collect();
        let n = kernels.len() as f64;

        let points = Self::linspace(lo, hi, n_points)
            .into_iter()
            .map(|x| (x, kernels.iter().map(|k| k.pdf(x)).sum::<f64>() / n))
            .collect();

        Some(DensityCurve { bandwidth, points })
    }

    /// Pearson correlation over the positions where both inputs are present.
    /// `NaN` when fewer than two pairs remain or either side is constant.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter_map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
                _ => None,
            })
            .unzip();

        if xs.len() < 2 {
            return f64::NAN;
        }

        let denom = (&xs).std_dev() * (&ys).std_dev();
        if denom == 0.0 {
            return f64::NAN;
        }
        let r = (&xs).covariance(&ys) / denom;
        r.clamp(-1.0, 1.0)
    }

    /// Pairwise Pearson correlation matrix of the given columns.
    ///
    /// Columns are cast to `f64`; a column that cannot be cast is an error.
    pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<Vec<f64>>> {
        let data = columns
            .iter()
            .map(|name| {
                let values = df
                    .column(name)?
                    .as_materialized_series()
                    .strict_cast(&DataType::Float64)?;
                Ok(values.f64()?.into_iter().collect::<Vec<Option<f64>>>())
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        let n = data.len();
        let mut matrix = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = Self::pearson(&data[i], &data[j]);
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn histogram_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 4.0, 5.0];
        let bins = StatsCalculator::histogram(&values, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        let area: f64 = bins.iter().map(|b| b.density * (b.end - b.start)).sum();
        assert_close(area, 1.0);
        assert_close(bins[0].start, 1.0);
        assert_close(bins[3].end, 5.0);
    }

    #[test]
    fn infinities_are_not_binned() {
        let series = Series::new(
            "x".into(),
            &[Some(1.0), Some(f64::INFINITY), None, Some(2.0), Some(f64::NEG_INFINITY)],
        );
        let values = StatsCalculator::finite_values(&series).unwrap();
        assert_eq!(values, vec![1.0, 2.0]);

        let bins = StatsCalculator::histogram(&values, 2);
        assert_close(bins[0].start, 1.0);
        assert_close(bins[1].end, 2.0);
        assert!(bins.iter().all(|b| b.density.is_finite()));
    }

    #[test]
    fn histogram_max_lands_in_last_bin() {
        let bins = StatsCalculator::histogram(&[0.0, 10.0], 10);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[9].count, 1);
    }

    #[test]
    fn histogram_of_constant_sample_is_centered() {
        let bins = StatsCalculator::histogram(&[3.0, 3.0], 2);
        assert_close(bins[0].start, 2.5);
        assert_close(bins[1].end, 3.5);
        assert_eq!(bins[1].count, 2);
    }

    #[test]
    fn histogram_of_empty_sample_is_flat() {
        let bins = StatsCalculator::histogram(&[], 5);
        assert_eq!(bins.len(), 5);
        assert!(bins.iter().all(|b| b.density == 0.0));
    }

    #[test]
    fn linspace_includes_both_ends() {
        let xs = StatsCalculator::linspace(0.0, 1.0, 5);
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn kde_uses_scott_bandwidth() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let kde = StatsCalculator::gaussian_kde(&values, 100).unwrap();
        let expected = (2.5f64).sqrt() * 5f64.powf(-0.2);
        assert_close(kde.bandwidth, expected);
        assert_eq!(kde.points.len(), 100);
        assert_close(kde.points[0].0, 1.0);
        assert_close(kde.points[99].0, 5.0);
        // symmetric sample, symmetric density
        assert_close(kde.points[0].1, kde.points[99].1);
    }

    #[test]
    fn kde_needs_spread() {
        assert!(StatsCalculator::gaussian_kde(&[1.0], 100).is_none());
        assert!(StatsCalculator::gaussian_kde(&[2.0, 2.0, 2.0], 100).is_none());
    }

    #[test]
    fn pearson_of_linear_data() {
        let x: Vec<Option<f64>> = (0..10).map(|v| Some(v as f64)).collect();
        let y: Vec<Option<f64>> = (0..10).map(|v| Some(3.0 - 2.0 * v as f64)).collect();
        assert_close(StatsCalculator::pearson(&x, &x), 1.0);
        assert_close(StatsCalculator::pearson(&x, &y), -1.0);
    }

    #[test]
    fn pearson_skips_incomplete_pairs() {
        let x = [Some(1.0), Some(2.0), None, Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        assert_close(StatsCalculator::pearson(&x, &y), 1.0);
        assert!(StatsCalculator::pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let df = df!(
            "a" => &[1, 2, 3, 4],
            "b" => &[1.0, 3.0, 2.0, 5.0],
            "c" => &[4.0, 3.0, 2.0, 1.0]
        )
        .unwrap();
        let cols = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let m = StatsCalculator::correlation_matrix(&df, &cols).unwrap();
        assert_close(m[0][0], 1.0);
        assert_close(m[0][2], -1.0);
        assert_close(m[1][0], m[0][1]);
    }

    #[test]
    fn correlation_of_text_column_fails() {
        let df = df!("a" => &["x", "y"], "b" => &[1.0, 2.0]).unwrap();
        let cols = vec!["a".to_string(), "b".to_string()];
        assert!(StatsCalculator::correlation_matrix(&df, &cols).is_err());
    }
}
