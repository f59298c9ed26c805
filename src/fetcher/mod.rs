//! Distribution fetchers
//!
//! A fetcher performs exactly one network retrieval per call. It never retries;
//! retry policy belongs to the caller. [`fetch`] adapts a fetcher result into the
//! tri-state [`DownloadOutcome`] the scheduler collects.

use crate::downloader::DownloadOutcome;
use crate::ResolutionTuple;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

pub mod http;
pub mod session;

pub use http::HttpDistributionFetcher;
pub use session::Session;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-2xx response from the service
    #[error("HTTP {status} {reason}")]
    HttpStatus {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase
        reason: String,
    },

    /// Request exceeded the per-request timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection or transport failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Local write failure
    #[error("IO error: {0}")]
    IoError(String),

    /// HTTP client could not be built
    #[error("client configuration error: {0}")]
    ClientBuild(String),
}

impl FetcherError {
    /// Classify a transport error
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetcherError::Timeout(err.to_string())
        } else {
            FetcherError::NetworkError(err.to_string())
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Retrieves one distribution per call
#[async_trait]
pub trait DistributionFetcher: Send + Sync {
    /// Stream the distribution body into `destination`
    ///
    /// # Returns
    /// Number of bytes written
    async fn fetch_to_file(
        &self,
        tuple: &ResolutionTuple,
        destination: &Path,
    ) -> FetcherResult<u64>;

    /// Read the distribution body into memory
    async fn fetch_bytes(&self, tuple: &ResolutionTuple) -> FetcherResult<Bytes>;
}

/// Build the remote address of a distribution
///
/// `{root}/catalogs/{catalog}/datasets/{dataset}/datasetseries/{series_id}/distributions/{format}`,
/// or `{root}/catalogs/{catalog}/datasets/{dataset}/sample/distributions/csv` for the sample export.
pub fn distribution_url(root_url: &str, tuple: &ResolutionTuple) -> String {
    let root = root_url.trim_end_matches('/');
    if tuple.is_sample() {
        format!(
            "{}/catalogs/{}/datasets/{}/sample/distributions/csv",
            root, tuple.catalog, tuple.dataset
        )
    } else {
        format!(
            "{}/catalogs/{}/datasets/{}/datasetseries/{}/distributions/{}",
            root,
            tuple.catalog,
            tuple.dataset,
            tuple.series_id(),
            tuple.format
        )
    }
}

/// Fetch one tuple into `destination` and report the outcome without raising
pub async fn fetch(
    fetcher: &dyn DistributionFetcher,
    tuple: &ResolutionTuple,
    destination: &Path,
) -> DownloadOutcome {
    match fetcher.fetch_to_file(tuple, destination).await {
        Ok(_) => DownloadOutcome::success(destination),
        Err(e) => DownloadOutcome::failure(destination, e.to_string()),
    }
}
