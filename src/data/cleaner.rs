//! Data Cleaner Module
//! Filters, type-normalizes and fills the raw table.

use crate::data::schema::{untyped_columns, FillPlan, CONTINENT, CORE_COLUMNS, DATE};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Required column '{0}' is missing")]
    MissingColumn(&'static str),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date. Date-times keep only their date part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Produces a cleaned copy of the raw table; the input is never modified.
pub struct DataCleaner;

impl DataCleaner {
    /// Apply the cleaning steps in order:
    /// 1. drop rows without a continent
    /// 2. parse dates (failures become null)
    /// 3. fill missing numbers with 0
    /// 4. fill missing text with "Unknown"
    /// 5. drop rows whose date is null
    /// 6. floor clipped columns at 0
    pub fn clean(raw: &DataFrame) -> Result<DataFrame, CleanerError> {
        for spec in CORE_COLUMNS.iter().filter(|spec| spec.required) {
            if raw.column(spec.name).is_err() {
                return Err(CleanerError::MissingColumn(spec.name));
            }
        }

        // Decided on the whole table, before any row is dropped.
        let untyped = untyped_columns(raw);

        let with_continent = raw
            .clone()
            .lazy()
            .filter(col(CONTINENT).is_not_null())
            .collect()?;
        debug!(
            dropped = raw.height() - with_continent.height(),
            "rows without continent removed"
        );

        let typed = Self::coerce_core_columns(with_continent)?;
        let mut typed = Self::coerce_untyped_columns(typed, &untyped)?;
        let dates = Self::parse_date_column(typed.column(DATE)?)?;
        typed.with_column(dates)?;

        let plan = FillPlan::for_frame(&typed);
        let before = typed.height();
        let mut lazy = typed.lazy();
        let fills = plan.exprs();
        if !fills.is_empty() {
            lazy = lazy.with_columns(fills);
        }
        lazy = lazy.filter(col(DATE).is_not_null());

        let clips: Vec<Expr> = CORE_COLUMNS
            .iter()
            .filter(|spec| spec.clip_negative)
            .filter(|spec| raw.column(spec.name).is_ok())
            .map(|spec| {
                when(col(spec.name).lt(lit(0.0)))
                    .then(lit(0.0))
                    .otherwise(col(spec.name))
                    .alias(spec.name)
            })
            .collect();
        if !clips.is_empty() {
            lazy = lazy.with_columns(clips);
        }

        let cleaned = lazy.collect()?;
        debug!(
            filled_columns = plan.entries.len(),
            invalid_dates = before - cleaned.height(),
            "cleaning finished"
        );
        Ok(cleaned)
    }

    /// Cast text and numeric core columns to their declared types.
    fn coerce_core_columns(mut df: DataFrame) -> Result<DataFrame, CleanerError> {
        for spec in CORE_COLUMNS.iter() {
            let Some(dtype) = spec.kind.dtype() else {
                continue;
            };
            let Ok(column) = df.column(spec.name) else {
                continue;
            };
            if column.dtype() == &dtype {
                continue;
            }
            let cast = column.cast(&dtype)?;
            df.with_column(cast)?;
        }
        Ok(df)
    }

    /// Columns empty on every row carry no type; treat them as numbers.
    fn coerce_untyped_columns(
        mut df: DataFrame,
        names: &[String],
    ) -> Result<DataFrame, CleanerError> {
        for name in names {
            let cast = df.column(name)?.cast(&DataType::Float64)?;
            df.with_column(cast)?;
        }
        if !names.is_empty() {
            debug!(columns = ?names, "empty columns typed as numeric");
        }
        Ok(df)
    }

    /// Parse the date column into a Date column of the same name.
    fn parse_date_column(column: &Column) -> Result<Series, CleanerError> {
        let text = column.cast(&DataType::String)?;
        let dates: Vec<Option<NaiveDate>> = text
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|value| value.and_then(parse_date))
            .collect();
        Ok(Series::new(DATE.into(), dates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::{date_values, float_values, text_values};

    fn sample() -> DataFrame {
        df!(
            "continent" => [None, Some("Europe"), Some("Europe"), Some("Asia")],
            "location" => [Some("World"), Some("France"), None, Some("Japan")],
            "date" => ["2021-01-01", "2021-01-01", "not a date", "2021-01-02"],
            "total_cases" => [Some(100.0), Some(-5.0), Some(3.0), None],
            "new_cases" => [Some(10.0), Some(-3.0), None, Some(7.0)],
            "new_deaths" => [Some(1.0), None, Some(0.0), Some(2.0)],
            "reproduction_rate" => [None, None, Some(0.9), Some(1.2)],
            "tests_units" => [Some("x"), None, None, Some("people tested")],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4);
        assert_eq!(parse_date("2021-03-04"), expected);
        assert_eq!(parse_date("2021/03/04"), expected);
        assert_eq!(parse_date("2021-03-04 12:30:00"), expected);
        assert_eq!(parse_date("2021-03-04T12:30:00"), expected);
        assert_eq!(parse_date("2021-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_rows_without_continent_removed() {
        let raw = df!(
            "continent" => [None, Some("Europe")],
            "location" => ["World", "France"],
            "date" => ["2021-01-01", "2021-01-01"],
            "total_cases" => [100.0, 50.0],
        )
        .unwrap();

        let cleaned = DataCleaner::clean(&raw).unwrap();
        assert_eq!(cleaned.height(), 1);
        assert_eq!(
            text_values(&cleaned, "location").unwrap(),
            vec![Some("France".to_string())]
        );
        assert_eq!(float_values(&cleaned, "total_cases").unwrap(), vec![50.0]);
    }

    #[test]
    fn test_negative_counts_clipped() {
        let raw = df!(
            "continent" => ["Europe"],
            "location" => ["France"],
            "date" => ["2021-01-01"],
            "total_cases" => [-5.0],
            "new_cases" => [-3.0],
        )
        .unwrap();

        let cleaned = DataCleaner::clean(&raw).unwrap();
        assert_eq!(cleaned.height(), 1);
        assert_eq!(float_values(&cleaned, "total_cases").unwrap(), vec![0.0]);
        assert_eq!(float_values(&cleaned, "new_cases").unwrap(), vec![0.0]);
    }

    #[test]
    fn test_missing_values_filled() {
        let cleaned = DataCleaner::clean(&sample()).unwrap();

        // World (no continent) and the unparsable date are gone.
        assert_eq!(cleaned.height(), 2);
        assert_eq!(
            float_values(&cleaned, "reproduction_rate").unwrap(),
            vec![0.0, 1.2]
        );
        assert_eq!(
            text_values(&cleaned, "tests_units").unwrap(),
            vec![Some("Unknown".to_string()), Some("people tested".to_string())]
        );
        assert_eq!(float_values(&cleaned, "new_deaths").unwrap(), vec![0.0, 2.0]);
        assert_eq!(float_values(&cleaned, "total_cases").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_location_becomes_unknown() {
        let raw = df!(
            "continent" => ["Europe"],
            "location" => [None::<&str>],
            "date" => ["2021-01-01"],
        )
        .unwrap();

        let cleaned = DataCleaner::clean(&raw).unwrap();
        assert_eq!(
            text_values(&cleaned, "location").unwrap(),
            vec![Some("Unknown".to_string())]
        );
    }

    #[test]
    fn test_missing_boolean_becomes_unknown() {
        let raw = df!(
            "continent" => ["Europe", "Europe", "Asia"],
            "location" => ["France", "Spain", "Japan"],
            "date" => ["2021-01-01", "2021-01-01", "2021-01-01"],
            "flag" => [Some(true), None, Some(false)],
        )
        .unwrap();

        let cleaned = DataCleaner::clean(&raw).unwrap();
        assert_eq!(cleaned.column("flag").unwrap().null_count(), 0);
        assert_eq!(
            text_values(&cleaned, "flag").unwrap(),
            vec![
                Some("true".to_string()),
                Some("Unknown".to_string()),
                Some("false".to_string()),
            ]
        );
    }

    #[test]
    fn test_complete_boolean_left_alone() {
        let raw = df!(
            "continent" => ["Europe"],
            "location" => ["France"],
            "date" => ["2021-01-01"],
            "flag" => [true],
        )
        .unwrap();

        let cleaned = DataCleaner::clean(&raw).unwrap();
        assert_eq!(cleaned.column("flag").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_empty_column_filled_with_zero() {
        let raw = df!(
            "continent" => [None, Some("Europe")],
            "location" => ["World", "France"],
            "date" => ["2021-01-01", "2021-01-01"],
            "excess_mortality" => [None::<&str>, None],
        )
        .unwrap();

        let cleaned = DataCleaner::clean(&raw).unwrap();
        assert_eq!(
            cleaned.column("excess_mortality").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(float_values(&cleaned, "excess_mortality").unwrap(), vec![0.0]);
    }

    #[test]
    fn test_cleaned_invariants_hold() {
        let raw = sample();
        let cleaned = DataCleaner::clean(&raw).unwrap();

        assert!(cleaned.height() <= raw.height());
        assert_eq!(cleaned.column("continent").unwrap().null_count(), 0);
        assert!(date_values(&cleaned, "date").unwrap().iter().all(Option::is_some));
        for name in ["total_cases", "new_cases"] {
            assert!(float_values(&cleaned, name).unwrap().iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let once = DataCleaner::clean(&sample()).unwrap();
        let twice = DataCleaner::clean(&once).unwrap();

        assert_eq!(once.shape(), twice.shape());
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_raw_table_untouched() {
        let raw = sample();
        let snapshot = raw.clone();
        DataCleaner::clean(&raw).unwrap();
        assert!(raw.equals_missing(&snapshot));
    }

    #[test]
    fn test_missing_required_column() {
        let raw = df!("location" => ["France"], "date" => ["2021-01-01"]).unwrap();
        let err = DataCleaner::clean(&raw).unwrap_err();
        assert!(matches!(err, CleanerError::MissingColumn("continent")));
    }
}
