//! COVID Trends - command line entry point
//!
//! Runs the pipeline with the built-in configuration and turns the outcome into
//! the process exit status.

use covid_trends::data::HttpFetcher;
use covid_trends::{run, PipelineConfig, PipelineError};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = PipelineConfig::default();
    let fetcher = match HttpFetcher::new(config.request_timeout) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            report_fatal(&PipelineError::Load(e.into()));
            return ExitCode::FAILURE;
        }
    };

    match run(&config, &fetcher) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_fatal(e: &PipelineError) {
    println!("{e}");
    if let Some(hint) = e.hint() {
        println!("{hint}");
    }
    error!(error = %e, "pipeline failed");
}
