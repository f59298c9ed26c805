//! HTTP distribution fetcher
//!
//! Streams a distribution body into a sibling `.part` file and renames it over
//! the destination once the body is complete, so an interrupted transfer never
//! leaves a partial file at the final path.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Response;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{distribution_url, DistributionFetcher, FetcherError, FetcherResult, Session};
use crate::metrics::FetchMetrics;
use crate::ResolutionTuple;

/// Suffix of the in-progress download file
pub const PARTIAL_SUFFIX: &str = "part";

/// Fetches distributions from the catalog service over HTTP
#[derive(Debug, Clone)]
pub struct HttpDistributionFetcher {
    session: Session,
}

impl HttpDistributionFetcher {
    /// Create a fetcher over a shared session
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Session this fetcher sends requests through
    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn send(&self, tuple: &ResolutionTuple) -> FetcherResult<Response> {
        let url = distribution_url(self.session.root_url(), tuple);
        debug!(url = %url, "Requesting distribution");

        let response = self
            .session
            .get(&url)
            .send()
            .await
            .map_err(FetcherError::from_transport)?;
        check_status(response)
    }
}

/// Reject non-2xx responses
pub(crate) fn check_status(response: Response) -> FetcherResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(FetcherError::HttpStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

/// Path of the temporary file used while `destination` is being written
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

async fn stream_to_file(response: Response, partial: &Path) -> FetcherResult<u64> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| FetcherError::IoError(format!("{}: {}", partial.display(), e)))?;

    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetcherError::from_transport)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| FetcherError::IoError(e.to_string()))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| FetcherError::IoError(e.to_string()))?;
    Ok(written)
}

async fn discard_partial(partial: &Path) {
    if let Err(rm) = tokio::fs::remove_file(partial).await {
        warn!(path = %partial.display(), error = %rm, "Failed to remove partial file");
    }
}

#[async_trait]
impl DistributionFetcher for HttpDistributionFetcher {
    async fn fetch_to_file(
        &self,
        tuple: &ResolutionTuple,
        destination: &Path,
    ) -> FetcherResult<u64> {
        let start = Instant::now();
        let response = self.send(tuple).await?;

        let partial = partial_path(destination);
        let written = match stream_to_file(response, &partial).await {
            Ok(n) => n,
            Err(e) => {
                discard_partial(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, destination).await {
            discard_partial(&partial).await;
            return Err(FetcherError::IoError(format!("{}: {}", destination.display(), e)));
        }

        FetchMetrics::record_fetch_duration(start.elapsed());
        debug!(
            tuple = %tuple,
            bytes = written,
            path = %destination.display(),
            "Distribution written"
        );
        Ok(written)
    }

    async fn fetch_bytes(&self, tuple: &ResolutionTuple) -> FetcherResult<Bytes> {
        let start = Instant::now();
        let response = self.send(tuple).await?;
        let body = response.bytes().await.map_err(FetcherError::from_transport)?;
        FetchMetrics::record_fetch_duration(start.elapsed());
        Ok(body)
    }
}
