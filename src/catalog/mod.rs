//! Series listing from the remote catalog
//!
//! The resolver works on the list of dated members of one dataset. This module
//! fetches that list from
//! `{root}/catalogs/{catalog}/datasets/{dataset}/datasetseries`, whose body is a
//! `{"resources": [...]}` envelope.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetcher::http::check_status;
use crate::fetcher::{FetcherError, Session};
use crate::SeriesMember;

/// Catalog listing errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Request failed before a usable response arrived
    #[error("listing request failed: {0}")]
    Request(#[from] FetcherError),

    /// Response body did not have the expected shape
    #[error("invalid listing response: {0}")]
    ParseError(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Source of dataset series listings
#[async_trait]
pub trait SeriesLister: Send + Sync {
    /// All members of `dataset` in `catalog`; may be empty
    async fn list_series(&self, catalog: &str, dataset: &str) -> CatalogResult<Vec<SeriesMember>>;
}

/// Lists series through the catalog HTTP API
#[derive(Debug, Clone)]
pub struct HttpSeriesLister {
    session: Session,
}

impl HttpSeriesLister {
    /// Create a lister over a shared session
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

/// Address of the series listing for one dataset
pub fn series_listing_url(root_url: &str, catalog: &str, dataset: &str) -> String {
    format!(
        "{}/catalogs/{}/datasets/{}/datasetseries",
        root_url.trim_end_matches('/'),
        catalog,
        dataset
    )
}

#[async_trait]
impl SeriesLister for HttpSeriesLister {
    async fn list_series(&self, catalog: &str, dataset: &str) -> CatalogResult<Vec<SeriesMember>> {
        let url = series_listing_url(self.session.root_url(), catalog, dataset);
        debug!(url = %url, "Listing dataset series");

        let response = self
            .session
            .get(&url)
            .send()
            .await
            .map_err(FetcherError::from_transport)?;
        let body: Value = check_status(response)?
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        parse_listing(&body, catalog, dataset)
    }
}

/// Extract members from a `{"resources": [...]}` listing body
///
/// Entries lacking an `identifier` are skipped. Missing `dataset`/`catalog`
/// fields are filled from the request.
pub fn parse_listing(body: &Value, catalog: &str, dataset: &str) -> CatalogResult<Vec<SeriesMember>> {
    let resources = body
        .get("resources")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::ParseError("missing 'resources' array".to_string()))?;

    let mut members = Vec::with_capacity(resources.len());
    for resource in resources {
        let Some(identifier) = resource.get("identifier").and_then(Value::as_str) else {
            warn!(dataset = %dataset, "Skipping listing entry without identifier");
            continue;
        };
        let text = |key: &str| resource.get(key).and_then(Value::as_str).map(str::to_string);

        members.push(SeriesMember {
            identifier: identifier.to_string(),
            created_date: text("createdDate"),
            dataset: text("dataset").unwrap_or_else(|| dataset.to_string()),
            catalog: text("catalog").unwrap_or_else(|| catalog.to_string()),
        });
    }

    debug!(dataset = %dataset, count = members.len(), "Parsed series listing");
    Ok(members)
}
