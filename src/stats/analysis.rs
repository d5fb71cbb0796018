//! Dataset Analysis
//! Scalar statistics and the cases/deaths correlation over the cleaned table.

use crate::data::columns::{date_values, float_values};
use crate::data::schema::{DATE, NEW_CASES, NEW_DEATHS, TOTAL_CASES};
use crate::stats::calculator::{CorrelationMatrix, StatsCalculator};
use crate::stats::format::format_grouped;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No rows to analyze")]
    EmptyTable,
    #[error("Column '{0}' has no values")]
    NoValues(&'static str),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Results of the basic analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Days between the earliest and latest observation.
    pub date_span_days: i64,
    pub mean_new_cases: f64,
    pub median_new_cases: f64,
    pub max_new_cases: f64,
    /// Largest cumulative count of any single location. Not a global sum.
    pub peak_total_cases: f64,
    pub correlation: CorrelationMatrix,
}

impl AnalysisReport {
    /// Scalar metrics by name.
    pub fn metrics(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("date_span_days", self.date_span_days as f64),
            ("mean_cases", self.mean_new_cases),
            ("median_cases", self.median_new_cases),
            ("max_cases", self.max_new_cases),
            ("total_cases", self.peak_total_cases),
        ])
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset covers {} days", self.date_span_days)?;
        writeln!(f, "Mean daily new cases: {}", format_grouped(self.mean_new_cases, 2))?;
        writeln!(
            f,
            "Median daily new cases: {}",
            format_grouped(self.median_new_cases, 2)
        )?;
        writeln!(
            f,
            "Maximum daily new cases: {}",
            format_grouped(self.max_new_cases, 2)
        )?;
        writeln!(
            f,
            "Total cases worldwide: {}",
            format_grouped(self.peak_total_cases, 2)
        )?;
        writeln!(f)?;
        writeln!(f, "Correlation between new cases and deaths:")?;
        write!(f, "{}", self.correlation)
    }
}

pub struct Analyzer;

impl Analyzer {
    pub fn analyze(df: &DataFrame) -> Result<AnalysisReport, AnalysisError> {
        if df.height() == 0 {
            return Err(AnalysisError::EmptyTable);
        }

        let new_cases = float_values(df, NEW_CASES)?;
        let total_cases = float_values(df, TOTAL_CASES)?;
        let new_deaths = float_values(df, NEW_DEATHS)?;

        let cases = StatsCalculator::summarize(&new_cases);
        if cases.count == 0 {
            return Err(AnalysisError::NoValues(NEW_CASES));
        }
        let totals = StatsCalculator::summarize(&total_cases);
        if totals.count == 0 {
            return Err(AnalysisError::NoValues(TOTAL_CASES));
        }

        let dates = date_values(df, DATE)?;
        let first = dates.iter().flatten().min().copied();
        let last = dates.iter().flatten().max().copied();
        let date_span_days = match (first, last) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => return Err(AnalysisError::NoValues(DATE)),
        };

        let correlation = StatsCalculator::correlation_matrix(&[
            (NEW_CASES, &new_cases[..]),
            (NEW_DEATHS, &new_deaths[..]),
        ]);
        debug!(rows = df.height(), date_span_days, "analysis computed");

        Ok(AnalysisReport {
            date_span_days,
            mean_new_cases: cases.mean,
            median_new_cases: cases.median,
            max_new_cases: cases.max,
            peak_total_cases: totals.max,
            correlation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataCleaner;

    fn cleaned() -> DataFrame {
        let raw = df!(
            "continent" => ["Europe", "Europe", "Asia", "Asia"],
            "location" => ["France", "France", "Japan", "Japan"],
            "date" => ["2021-01-01", "2021-01-11", "2021-01-01", "2021-01-11"],
            "total_cases" => [100.0, 160.0, 40.0, 50.0],
            "new_cases" => [10.0, 60.0, 4.0, 10.0],
            "new_deaths" => [1.0, 6.0, 0.0, 1.0],
        )
        .unwrap();
        DataCleaner::clean(&raw).unwrap()
    }

    #[test]
    fn test_analysis_values() {
        let report = Analyzer::analyze(&cleaned()).unwrap();

        assert_eq!(report.date_span_days, 10);
        assert!((report.mean_new_cases - 21.0).abs() < 1e-9);
        assert!((report.median_new_cases - 10.0).abs() < 1e-9);
        assert_eq!(report.max_new_cases, 60.0);
        assert_eq!(report.peak_total_cases, 160.0);

        let r = report.correlation.get(NEW_CASES, NEW_DEATHS).unwrap();
        assert!(r > 0.99);
    }

    #[test]
    fn test_metrics_map() {
        let report = Analyzer::analyze(&cleaned()).unwrap();
        let metrics = report.metrics();
        assert_eq!(metrics["total_cases"], 160.0);
        assert_eq!(metrics["date_span_days"], 10.0);
        assert_eq!(metrics.len(), 5);
    }

    #[test]
    fn test_report_display() {
        let text = Analyzer::analyze(&cleaned()).unwrap().to_string();
        assert!(text.starts_with("Dataset covers 10 days\n"));
        assert!(text.contains("Mean daily new cases: 21.00"));
        assert!(text.contains("Total cases worldwide: 160.00"));
        assert!(text.contains("Correlation between new cases and deaths:"));
    }

    #[test]
    fn test_empty_table_is_error() {
        let empty = cleaned().head(Some(0));
        assert!(matches!(
            Analyzer::analyze(&empty),
            Err(AnalysisError::EmptyTable)
        ));
    }

    #[test]
    fn test_missing_deaths_column_is_error() {
        let df = cleaned().drop(NEW_DEATHS).unwrap();
        assert!(matches!(
            Analyzer::analyze(&df),
            Err(AnalysisError::Polars(_))
        ));
    }
}
