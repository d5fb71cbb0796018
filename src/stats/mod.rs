//! Stats module - descriptive statistics and dataset analysis

mod analysis;
mod calculator;
mod format;

pub use analysis::{AnalysisError, AnalysisReport, Analyzer};
pub use calculator::{CorrelationMatrix, SeriesSummary, StatsCalculator};
pub use format::format_grouped;
