//! CSV Data Loader Module
//! Downloads the dataset and parses it into a Polars DataFrame.

use crate::data::fetch::{FetchError, Fetcher};
use polars::prelude::*;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] PolarsError),
    #[error("The dataset is empty")]
    EmptyDataset,
}

impl LoaderError {
    /// True for failures on the network side (transport or HTTP status).
    pub fn is_network(&self) -> bool {
        matches!(self, LoaderError::Fetch(_))
    }
}

/// Fetches a CSV resource through a [`Fetcher`] and parses it.
pub struct DataLoader<'a, F: Fetcher> {
    fetcher: &'a F,
}

impl<'a, F: Fetcher> DataLoader<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Download `url` and parse the body as CSV.
    pub fn load(&self, url: &str) -> Result<DataFrame, LoaderError> {
        let bytes = self.fetcher.fetch(url)?;
        Self::parse_csv(bytes)
    }

    /// Parse a CSV body. Blank bodies and tables without rows are empty datasets.
    pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(LoaderError::EmptyDataset);
        }

        // Full-file inference: sparse OWID columns are often null for the first
        // several thousand rows.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        if df.width() == 0 || df.height() == 0 {
            return Err(LoaderError::EmptyDataset);
        }

        debug!(rows = df.height(), columns = df.width(), "csv parsed");
        Ok(df)
    }
}
