//! Data module - dataset download, CSV loading and cleaning

mod cleaner;
pub mod columns;
mod fetch;
mod loader;
pub mod schema;

pub use cleaner::{parse_date, CleanerError, DataCleaner};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use loader::{DataLoader, LoaderError};
