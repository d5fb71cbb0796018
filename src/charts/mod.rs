//! Charts module - Static chart rendering

mod renderer;
mod series;

pub use renderer::{write_png, ChartError, ChartKind, ChartOutcome, ChartRenderer, TOP_N};
pub use series::{daily_new_cases, monthly_mean_new_cases, top_locations_by_total_cases, YearMonth};
