//! Chart Series
//! Aggregations behind each chart, kept free of any drawing code.

use crate::data::columns::{date_values, float_values, text_values};
use crate::data::schema::{DATE, LOCATION, NEW_CASES, TOTAL_CASES};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Sum of new_cases over all locations per date, in date order.
pub fn daily_new_cases(df: &DataFrame) -> PolarsResult<Vec<(NaiveDate, f64)>> {
    let dates = date_values(df, DATE)?;
    let cases = float_values(df, NEW_CASES)?;

    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, value) in dates.into_iter().zip(cases) {
        let Some(date) = date else { continue };
        let entry = totals.entry(date).or_insert(0.0);
        if !value.is_nan() {
            *entry += value;
        }
    }
    Ok(totals.into_iter().collect())
}

/// The `n` locations with the highest peak total_cases, descending.
/// Equal peaks keep location name order.
pub fn top_locations_by_total_cases(df: &DataFrame, n: usize) -> PolarsResult<Vec<(String, f64)>> {
    let locations = text_values(df, LOCATION)?;
    let totals = float_values(df, TOTAL_CASES)?;

    let mut peaks: BTreeMap<String, f64> = BTreeMap::new();
    for (location, value) in locations.into_iter().zip(totals) {
        let Some(location) = location else { continue };
        if value.is_nan() {
            continue;
        }
        peaks
            .entry(location)
            .and_modify(|peak| *peak = peak.max(value))
            .or_insert(value);
    }

    let mut ranked: Vec<(String, f64)> = peaks.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    Ok(ranked)
}

/// Mean new_cases per calendar month over every location-day row.
pub fn monthly_mean_new_cases(df: &DataFrame) -> PolarsResult<Vec<(YearMonth, f64)>> {
    let dates = date_values(df, DATE)?;
    let cases = float_values(df, NEW_CASES)?;

    let mut sums: BTreeMap<YearMonth, (f64, usize)> = BTreeMap::new();
    for (date, value) in dates.into_iter().zip(cases) {
        let (Some(date), false) = (date, value.is_nan()) else {
            continue;
        };
        let entry = sums.entry(YearMonth::from(date)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(month, (sum, count))| (month, sum / count as f64))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataCleaner;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cleaned(locations: &[&str], dates: &[&str], totals: &[f64], new_cases: &[f64]) -> DataFrame {
        let continents = vec!["Europe"; locations.len()];
        let raw = df!(
            "continent" => continents,
            "location" => locations,
            "date" => dates,
            "total_cases" => totals,
            "new_cases" => new_cases,
        )
        .unwrap();
        DataCleaner::clean(&raw).unwrap()
    }

    #[test]
    fn test_daily_sums_in_date_order() {
        let df = cleaned(
            &["A", "B", "A", "B"],
            &["2021-01-02", "2021-01-02", "2021-01-01", "2021-01-01"],
            &[0.0; 4],
            &[5.0, 7.0, 1.0, 2.0],
        );

        let daily = daily_new_cases(&df).unwrap();
        assert_eq!(daily, vec![(date(2021, 1, 1), 3.0), (date(2021, 1, 2), 12.0)]);
    }

    #[test]
    fn test_top_locations_ordering_and_limit() {
        let names: Vec<String> = (0..12).map(|i| format!("L{i:02}")).collect();
        let locations: Vec<&str> = names.iter().map(String::as_str).collect();
        let dates = vec!["2021-01-01"; 12];
        let totals: Vec<f64> = (0..12).map(|i| (i * 10) as f64).collect();
        let df = cleaned(&locations, &dates, &totals, &[0.0; 12]);

        let top = top_locations_by_total_cases(&df, 10).unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], ("L11".to_string(), 110.0));
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(top.iter().all(|(name, _)| name != "L00" && name != "L01"));
    }

    #[test]
    fn test_top_locations_uses_peak_and_name_ties() {
        let df = cleaned(
            &["France", "France", "Chile", "Brazil"],
            &["2021-01-01", "2021-01-02", "2021-01-01", "2021-01-01"],
            &[10.0, 30.0, 30.0, 5.0],
            &[0.0; 4],
        );

        let top = top_locations_by_total_cases(&df, 10).unwrap();
        assert_eq!(
            top,
            vec![
                ("Chile".to_string(), 30.0),
                ("France".to_string(), 30.0),
                ("Brazil".to_string(), 5.0),
            ]
        );
    }

    #[test]
    fn test_monthly_mean_ignores_location() {
        let df = cleaned(
            &["A", "B", "A", "B"],
            &["2021-01-05", "2021-01-20", "2021-02-01", "2021-02-01"],
            &[0.0; 4],
            &[2.0, 4.0, 10.0, 20.0],
        );

        let monthly = monthly_mean_new_cases(&df).unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].0.to_string(), "2021-01");
        assert_eq!(monthly[0].1, 3.0);
        assert_eq!(monthly[1].0, YearMonth { year: 2021, month: 2 });
        assert_eq!(monthly[1].1, 15.0);
    }
}
