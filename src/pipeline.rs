//! Pipeline Driver
//! Runs Loader -> Cleaner -> Analyzer -> Visualizer and prints progress.
//!
//! Loading and cleaning failures are returned to the caller, which decides the
//! exit status. Analysis and chart failures are reported and the run goes on.

use crate::charts::{ChartOutcome, ChartRenderer};
use crate::config::PipelineConfig;
use crate::data::{CleanerError, DataCleaner, DataLoader, Fetcher, LoaderError};
use crate::stats::{AnalysisReport, Analyzer};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{}", load_message(.0))]
    Load(#[from] LoaderError),
    #[error("Error cleaning dataset: {0}")]
    Clean(#[from] CleanerError),
}

fn load_message(e: &LoaderError) -> String {
    match e {
        LoaderError::EmptyDataset => "Error: The dataset is empty".to_string(),
        LoaderError::Parse(e) => format!("Unexpected error loading dataset: {e}"),
        LoaderError::Fetch(e) => format!("Error loading dataset: {e}"),
    }
}

impl PipelineError {
    /// Extra hint shown under the diagnostic.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PipelineError::Load(e) if e.is_network() => {
                Some("Please check your internet connection or try again later.")
            }
            _ => None,
        }
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub rows_loaded: usize,
    pub rows_cleaned: usize,
    /// `None` when the analysis failed.
    pub analysis: Option<AnalysisReport>,
    /// Empty when the output directory could not be created.
    pub charts: Vec<ChartOutcome>,
}

impl PipelineOutcome {
    pub fn all_charts_saved(&self) -> bool {
        !self.charts.is_empty() && self.charts.iter().all(ChartOutcome::is_ok)
    }
}

/// Run the whole pipeline against `fetcher`.
pub fn run<F: Fetcher>(
    config: &PipelineConfig,
    fetcher: &F,
) -> Result<PipelineOutcome, PipelineError> {
    println!("Loading dataset...");
    let raw = DataLoader::new(fetcher).load(&config.dataset_url)?;
    let (rows_loaded, columns) = raw.shape();
    println!("Dataset loaded: {rows_loaded} rows, {columns} columns");
    info!(url = %config.dataset_url, rows = rows_loaded, columns, "dataset loaded");

    println!("\nCleaning dataset...");
    let cleaned = DataCleaner::clean(&raw)?;
    let rows_cleaned = cleaned.height();
    println!("Dataset cleaned. Remaining rows: {rows_cleaned}");

    let analysis = analyze(&cleaned);
    let charts = visualize(config, &cleaned);

    Ok(PipelineOutcome {
        rows_loaded,
        rows_cleaned,
        analysis,
        charts,
    })
}

fn analyze(cleaned: &DataFrame) -> Option<AnalysisReport> {
    println!("\n--- Basic Analysis ---");
    match Analyzer::analyze(cleaned) {
        Ok(report) => {
            println!("{report}");
            if let Ok(json) = serde_json::to_string(&report) {
                debug!(report = %json, "analysis report");
            }
            Some(report)
        }
        Err(e) => {
            println!("Error performing analysis: {e}");
            error!(error = %e, "analysis failed");
            None
        }
    }
}

fn visualize(config: &PipelineConfig, cleaned: &DataFrame) -> Vec<ChartOutcome> {
    println!("\nGenerating visualizations...");
    let renderer = ChartRenderer::new(config.output_dir.clone(), config.dpi);
    let rendered =
        renderer.render_all_with(cleaned, |kind| println!("{}", kind.progress_label()));
    let charts = match rendered {
        Ok(charts) => charts,
        Err(e) => {
            println!("Error creating visualizations: {e}");
            error!(error = %e, "visualization aborted");
            return Vec::new();
        }
    };

    for outcome in charts.iter() {
        if let Err(e) = &outcome.result {
            println!("Error creating visualizations: {}: {e}", outcome.kind.file_name());
        }
    }
    if charts.iter().all(ChartOutcome::is_ok) {
        println!(
            "\nAll visualizations saved successfully in '{}' directory.",
            renderer.output_dir().display()
        );
    }
    charts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FetchError;

    #[test]
    fn test_network_failures_carry_hint() {
        let err = PipelineError::Load(LoaderError::Fetch(FetchError::Status {
            url: "https://example.test".to_string(),
            status: 503,
        }));
        assert_eq!(err.to_string(), "Error loading dataset: URL returned status code 503");
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_empty_dataset_message() {
        let err = PipelineError::Load(LoaderError::EmptyDataset);
        assert_eq!(err.to_string(), "Error: The dataset is empty");
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_clean_failure_message() {
        let err = PipelineError::Clean(CleanerError::MissingColumn("date"));
        assert_eq!(
            err.to_string(),
            "Error cleaning dataset: Required column 'date' is missing"
        );
    }
}
