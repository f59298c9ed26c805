//! # Catalog Data Downloader Library
//!
//! A client-side retrieval engine for dated dataset distributions published by a
//! remote data catalog service. Given a dataset and a date-range expression it
//! resolves the matching series members, downloads every distribution with
//! bounded concurrency, lays the files out on disk and can materialize them into
//! a single in-memory table.
//!
//! ## Features
//!
//! - **Date-Range Resolution**: `latest`, single dates, closed/open ranges and a `sample` export
//! - **Bounded Concurrency**: a fixed-size worker pool with per-item success/failure
//! - **Idempotent Re-runs**: existing non-empty files are reused instead of re-fetched
//! - **Partitioned Layout**: flat filenames or hive-style `key=value` directories
//! - **Materialization**: CSV, PSV, JSON and Parquet decoded and unioned into one [`Table`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_data_downloader::config::ClientConfig;
//! use catalog_data_downloader::{DataClient, DistributionFormat, DownloadRequest, PartitionMode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DataClient::new(ClientConfig::default())?;
//!
//! let request = DownloadRequest::new("FX_SPOT_RATES")
//!     .with_dt("2020-01-01:2020-01-31")
//!     .with_format(DistributionFormat::Csv)
//!     .with_partitioning(PartitionMode::Hive)
//!     .with_return_paths(true);
//!
//! if let Some(outcomes) = client.download(&request).await? {
//!     for outcome in &outcomes {
//!         println!("{outcome}");
//!     }
//! }
//!
//! let table = client
//!     .to_table("FX_SPOT_RATES", Some("2020-01-01:2020-01-31"), DistributionFormat::Csv, None, None)
//!     .await?;
//! println!("{} rows", table.num_rows());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`resolver`] - Date-range expressions resolved against a series listing
//! - [`catalog`] - Series listing from the remote catalog
//! - [`fetcher`] - One distribution retrieval into a file or a buffer
//! - [`downloader`] - Bounded-concurrency batch scheduling with ordered outcomes
//! - [`output`] - Destination path planning (flat or hive)
//! - [`table`] - Multi-file tabular materialization
//! - [`client`] - High-level facade tying the pieces together

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Series listing from the remote catalog
pub mod catalog;

/// CLI command implementations
pub mod cli;

/// High-level client facade
pub mod client;

/// Client configuration loading
pub mod config;

/// Download scheduling
pub mod downloader;

/// Distribution fetchers
pub mod fetcher;

/// Observability metrics
pub mod metrics;

/// Destination path planning
pub mod output;

/// Date-range expression resolution
pub mod resolver;

/// Tabular materialization of downloaded files
pub mod table;

// Re-export commonly used types
pub use client::{DataClient, DownloadRequest};
pub use downloader::DownloadOutcome;
pub use output::PartitionMode;
pub use resolver::{resolve, DateExpr};
pub use table::Table;

/// Identifier used by the service for the sample export of a dataset
pub const SAMPLE_SERIES_ID: &str = "sample";

/// One dated member of a dataset series, as returned by the catalog listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesMember {
    /// Series identifier (date-like, canonically `YYYY-MM-DD`)
    pub identifier: String,
    /// Publication timestamp as reported by the service
    #[serde(rename = "createdDate", default)]
    pub created_date: Option<String>,
    /// Dataset the member belongs to
    #[serde(default)]
    pub dataset: String,
    /// Catalog the dataset belongs to
    #[serde(default)]
    pub catalog: String,
}

impl SeriesMember {
    /// Create a member with no publication timestamp
    pub fn new(
        identifier: impl Into<String>,
        dataset: impl Into<String>,
        catalog: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            created_date: None,
            dataset: dataset.into(),
            catalog: catalog.into(),
        }
    }
}

/// Series selector carried by a [`ResolutionTuple`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesRef {
    /// A concrete series member identifier
    Member(String),
    /// The dataset's sample export
    Sample,
}

impl SeriesRef {
    /// Interpret a user-supplied series identifier
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.eq_ignore_ascii_case(SAMPLE_SERIES_ID) {
            SeriesRef::Sample
        } else {
            SeriesRef::Member(identifier.to_string())
        }
    }

    /// Identifier as used in addresses and filenames
    pub fn as_str(&self) -> &str {
        match self {
            SeriesRef::Member(id) => id,
            SeriesRef::Sample => SAMPLE_SERIES_ID,
        }
    }
}

impl fmt::Display for SeriesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of a distribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DistributionFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Pipe-separated values
    Psv,
    /// Apache Parquet
    Parquet,
    /// JSON records (array or newline-delimited)
    Json,
    /// Any other encoding the service publishes; downloadable but not decodable
    Other(String),
}

impl DistributionFormat {
    /// Lowercase format string used in addresses and file extensions
    pub fn as_str(&self) -> &str {
        match self {
            DistributionFormat::Csv => "csv",
            DistributionFormat::Psv => "psv",
            DistributionFormat::Parquet => "parquet",
            DistributionFormat::Json => "json",
            DistributionFormat::Other(ext) => ext,
        }
    }

    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Self {
        ext.parse().unwrap_or_else(|_| DistributionFormat::Other(ext.to_lowercase()))
    }
}

impl fmt::Display for DistributionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "csv" => Ok(DistributionFormat::Csv),
            "psv" => Ok(DistributionFormat::Psv),
            "parquet" => Ok(DistributionFormat::Parquet),
            "json" => Ok(DistributionFormat::Json),
            "" => Err("Invalid format: empty".to_string()),
            other if other.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Ok(DistributionFormat::Other(other.to_string()))
            }
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

/// Fully-specified address of one distribution to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionTuple {
    /// Catalog identifier
    pub catalog: String,
    /// Dataset identifier
    pub dataset: String,
    /// Series member (or the sample export)
    pub series: SeriesRef,
    /// Distribution encoding
    pub format: DistributionFormat,
}

impl ResolutionTuple {
    /// Create a tuple for a concrete series member
    pub fn new(
        catalog: impl Into<String>,
        dataset: impl Into<String>,
        series_id: impl Into<String>,
        format: DistributionFormat,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            dataset: dataset.into(),
            series: SeriesRef::Member(series_id.into()),
            format,
        }
    }

    /// Create the tuple for a dataset's sample export (always CSV)
    pub fn sample(catalog: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            dataset: dataset.into(),
            series: SeriesRef::Sample,
            format: DistributionFormat::Csv,
        }
    }

    /// Whether this tuple targets the sample export
    pub fn is_sample(&self) -> bool {
        self.series == SeriesRef::Sample
    }

    /// Series identifier as used in addresses and filenames
    pub fn series_id(&self) -> &str {
        self.series.as_str()
    }
}

impl fmt::Display for ResolutionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}.{}",
            self.catalog, self.dataset, self.series, self.format
        )
    }
}
