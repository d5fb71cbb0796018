//! COVID Trends - dataset cleaning, statistics and static charts
//!
//! Downloads the Our World in Data COVID-19 table, cleans it, prints summary
//! statistics and writes three PNG charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::PipelineConfig;
pub use pipeline::{run, PipelineError, PipelineOutcome};
