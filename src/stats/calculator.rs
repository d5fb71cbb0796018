//! Statistics Calculator Module
//! Descriptive statistics and pairwise Pearson correlation.

use serde::Serialize;
use statrs::statistics::Statistics;
use std::fmt;

/// Descriptive statistics for one series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
}

impl Default for SeriesSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Square correlation table with labelled rows and columns.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == column)?;
        Some(self.values[r][c])
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.labels.iter().map(String::len).max().unwrap_or(0);
        let cell_width = label_width.max(9);

        write!(f, "{:label_width$}", "")?;
        for label in &self.labels {
            write!(f, "  {label:>cell_width$}")?;
        }
        for (label, row) in self.labels.iter().zip(&self.values) {
            writeln!(f)?;
            write!(f, "{label:<label_width$}")?;
            for value in row {
                if value.is_nan() {
                    write!(f, "  {:>cell_width$}", "NaN")?;
                } else {
                    write!(f, "  {value:>cell_width$.6}")?;
                }
            }
        }
        Ok(())
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Mean, median and maximum over the non-NaN values.
    pub fn summarize(values: &[f64]) -> SeriesSummary {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let n = sorted.len();
        if n == 0 {
            return SeriesSummary::default();
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        SeriesSummary {
            count: n,
            mean,
            median,
            max: sorted[n - 1],
        }
    }

    /// Pearson correlation over the positions where both series have a value.
    /// NaN with fewer than two complete pairs or a constant series.
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter(|(a, b)| !a.is_nan() && !b.is_nan())
            .map(|(a, b)| (*a, *b))
            .unzip();
        if xs.len() < 2 {
            return f64::NAN;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 {
            return f64::NAN;
        }

        let r = xs.iter().covariance(ys.iter()) / (sx * sy);
        r.clamp(-1.0, 1.0)
    }

    /// Correlation matrix of named series, computed pairwise.
    pub fn correlation_matrix(series: &[(&str, &[f64])]) -> CorrelationMatrix {
        let labels = series.iter().map(|(name, _)| name.to_string()).collect();
        let values = series
            .iter()
            .map(|(_, a)| {
                series
                    .iter()
                    .map(|(_, b)| Self::pearson(a, b))
                    .collect()
            })
            .collect();
        CorrelationMatrix { labels, values }
    }
}
