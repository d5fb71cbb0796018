//! Typed column access shared by the analysis and chart code.

use chrono::NaiveDate;
use polars::prelude::*;

/// Column values as f64. Missing entries become NaN.
pub fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let ca = column.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Column values as owned strings.
pub fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let ca = column.as_materialized_series().str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Values of a Date column.
pub fn date_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.date()?.as_date_iter().collect())
}
