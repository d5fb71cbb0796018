//! Pipeline Configuration
//! Fixed run parameters. Nothing here is read from files, flags or the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Our World in Data COVID-19 dataset.
pub const DATASET_URL: &str =
    "https://raw.githubusercontent.com/owid/covid-19-data/master/public/data/owid-covid-data.csv";

/// Directory the three chart images are written to.
pub const OUTPUT_DIR: &str = "covid_visualizations";

/// Upper bound for the whole download.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolution of the saved charts.
pub const OUTPUT_DPI: u32 = 300;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub dataset_url: String,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub dpi: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_url: DATASET_URL.to_string(),
            output_dir: PathBuf::from(OUTPUT_DIR),
            request_timeout: REQUEST_TIMEOUT,
            dpi: OUTPUT_DPI,
        }
    }
}
