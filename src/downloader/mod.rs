//! Batch download scheduling
//!
//! The scheduler takes an ordered list of resolution tuples and fetches each
//! one on a bounded worker pool, consulting [`crate::output`] for destination
//! paths and prior downloads.
//!
//! # Quick Start
//!
//! ```no_run
//! use catalog_data_downloader::downloader::{BatchOptions, DownloadScheduler};
//! use catalog_data_downloader::fetcher::{HttpDistributionFetcher, Session};
//! use catalog_data_downloader::{DistributionFormat, ResolutionTuple};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::with_default_client("https://catalog.example.com/api/v1");
//! let scheduler = DownloadScheduler::new(Arc::new(HttpDistributionFetcher::new(session)));
//!
//! let tuples = vec![
//!     ResolutionTuple::new("common", "FX", "2020-01-01", DistributionFormat::Csv),
//!     ResolutionTuple::new("common", "FX", "2020-01-02", DistributionFormat::Csv),
//! ];
//! let outcomes = scheduler
//!     .run(&tuples, Path::new("downloads"), BatchOptions::default())
//!     .await?;
//! assert_eq!(outcomes.len(), tuples.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`scheduler`] - Worker pool and order-preserving outcome collection
//! - [`outcome`] - Per-item outcomes and batch summaries
//! - [`progress`] - Progress bar and periodic progress logging
//! - [`config`] - Concurrency and progress knobs
//!
//! # Error Handling
//!
//! Per-item fetch failures are recorded as [`DownloadOutcome::Failure`] and never
//! abort the batch. Only failing to prepare destination directories is an error.

use crate::output::OutputError;

pub mod config;
pub mod outcome;
pub mod progress;
pub mod scheduler;

pub use config::{SchedulerConfig, DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
pub use outcome::{BatchSummary, DownloadOutcome};
pub use scheduler::{BatchOptions, DownloadScheduler};

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Destination could not be prepared
    #[error("filesystem error: {0}")]
    Filesystem(#[from] OutputError),
}

/// Result type for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;
