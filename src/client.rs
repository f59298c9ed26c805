//! High-level client tying resolution, download and materialization together

use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::catalog::{CatalogError, HttpSeriesLister, SeriesLister};
use crate::config::{ClientConfig, ConfigError};
use crate::downloader::{BatchOptions, DownloadError, DownloadOutcome, DownloadScheduler, SchedulerConfig};
use crate::fetcher::{DistributionFetcher, FetcherError, HttpDistributionFetcher, Session};
use crate::output::PartitionMode;
use crate::resolver::{resolve, DateExpr, ResolveError};
use crate::table::{materialize_with_columns, Table, TableError};
use crate::{DistributionFormat, ResolutionTuple, SeriesMember, SeriesRef};

/// Errors surfaced by [`DataClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Date expression could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Series listing failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Download root could not be prepared
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Single in-memory fetch failed
    #[error(transparent)]
    Fetch(#[from] FetcherError),

    /// Downloaded files could not be materialized
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Parameters of one [`DataClient::download`] call
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Dataset identifier
    pub dataset: String,
    /// Date expression; `None` means latest
    pub dt: Option<String>,
    /// Distribution encoding
    pub format: DistributionFormat,
    /// Catalog; `None` means the configured default
    pub catalog: Option<String>,
    /// Download root; `None` means the configured default
    pub download_dir: Option<PathBuf>,
    /// On-disk layout
    pub partitioning: PartitionMode,
    /// Return the outcome list instead of `None`
    pub return_paths: bool,
    /// Render a progress bar
    pub show_progress: bool,
    /// Re-fetch files that already exist
    pub overwrite: bool,
}

impl DownloadRequest {
    /// Latest CSV distribution of `dataset` in the default catalog
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            dt: None,
            format: DistributionFormat::Csv,
            catalog: None,
            download_dir: None,
            partitioning: PartitionMode::Flat,
            return_paths: false,
            show_progress: false,
            overwrite: false,
        }
    }

    /// Set the date expression
    pub fn with_dt(mut self, dt: impl Into<String>) -> Self {
        self.dt = Some(dt.into());
        self
    }

    /// Set the distribution format
    pub fn with_format(mut self, format: DistributionFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the catalog
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Set the download root
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Set the on-disk layout
    pub fn with_partitioning(mut self, mode: PartitionMode) -> Self {
        self.partitioning = mode;
        self
    }

    /// Return outcomes from [`DataClient::download`]
    pub fn with_return_paths(mut self, return_paths: bool) -> Self {
        self.return_paths = return_paths;
        self
    }

    /// Show a progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Re-fetch existing files
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Entry point for resolving, downloading and materializing distributions
pub struct DataClient {
    config: ClientConfig,
    lister: Arc<dyn SeriesLister>,
    fetcher: Arc<dyn DistributionFetcher>,
}

impl DataClient {
    /// Build a client talking HTTP to `config.root_url`
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let session = Session::from_config(&config)?;
        let lister = Arc::new(HttpSeriesLister::new(session.clone()));
        let fetcher = Arc::new(HttpDistributionFetcher::new(session));
        Ok(Self::with_components(config, lister, fetcher))
    }

    /// Build a client over explicit collaborators
    pub fn with_components(
        config: ClientConfig,
        lister: Arc<dyn SeriesLister>,
        fetcher: Arc<dyn DistributionFetcher>,
    ) -> Self {
        Self {
            config,
            lister,
            fetcher,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn catalog_or_default<'a>(&'a self, catalog: Option<&'a str>) -> &'a str {
        catalog.unwrap_or(&self.config.default_catalog)
    }

    /// Members of `dataset`, unsorted, as the service returns them
    pub async fn list_series(
        &self,
        catalog: Option<&str>,
        dataset: &str,
    ) -> ClientResult<Vec<SeriesMember>> {
        let catalog = self.catalog_or_default(catalog);
        Ok(self.lister.list_series(catalog, dataset).await?)
    }

    /// Resolve a date expression into resolution tuples
    ///
    /// The series listing is only requested when the expression needs it.
    pub async fn resolve(
        &self,
        dataset: &str,
        dt: Option<&str>,
        format: &DistributionFormat,
        catalog: Option<&str>,
    ) -> ClientResult<Vec<ResolutionTuple>> {
        let catalog = self.catalog_or_default(catalog);
        let expr = DateExpr::parse(dt)?;
        let members = if expr.needs_listing() {
            self.lister.list_series(catalog, dataset).await?
        } else {
            Vec::new()
        };
        Ok(resolve(&members, &expr, catalog, dataset, format)?)
    }

    /// Download every distribution selected by `request`
    ///
    /// # Returns
    /// The ordered outcome list when `request.return_paths` is set, else `None`.
    /// Per-item failures are outcomes, never errors.
    pub async fn download(
        &self,
        request: &DownloadRequest,
    ) -> ClientResult<Option<Vec<DownloadOutcome>>> {
        let tuples = self
            .resolve(
                &request.dataset,
                request.dt.as_deref(),
                &request.format,
                request.catalog.as_deref(),
            )
            .await?;

        let root = request
            .download_dir
            .clone()
            .unwrap_or_else(|| self.config.download_dir.clone());
        info!(
            dataset = %request.dataset,
            count = tuples.len(),
            root = %root.display(),
            "Resolved distributions"
        );

        let outcomes = self
            .scheduler()
            .run(
                &tuples,
                &root,
                BatchOptions {
                    partition_mode: request.partitioning,
                    show_progress: request.show_progress,
                    overwrite: request.overwrite,
                },
            )
            .await?;

        Ok(request.return_paths.then_some(outcomes))
    }

    /// Resolve, download and materialize into one table
    pub async fn to_table(
        &self,
        dataset: &str,
        dt: Option<&str>,
        format: DistributionFormat,
        catalog: Option<&str>,
        columns: Option<&[String]>,
    ) -> ClientResult<Table> {
        let mut request = DownloadRequest::new(dataset)
            .with_format(format)
            .with_return_paths(true);
        request.dt = dt.map(str::to_string);
        request.catalog = catalog.map(str::to_string);

        let outcomes = self.download(&request).await?.unwrap_or_default();
        Ok(materialize_with_columns(&outcomes, columns)?)
    }

    /// Fetch one distribution into memory
    pub async fn to_bytes(
        &self,
        catalog: Option<&str>,
        dataset: &str,
        series: &str,
        format: DistributionFormat,
    ) -> ClientResult<Bytes> {
        let catalog = self.catalog_or_default(catalog);
        let tuple = match SeriesRef::from_identifier(series) {
            SeriesRef::Sample => ResolutionTuple::sample(catalog, dataset),
            SeriesRef::Member(id) => ResolutionTuple::new(catalog, dataset, id, format),
        };
        Ok(self.fetcher.fetch_bytes(&tuple).await?)
    }

    fn scheduler(&self) -> DownloadScheduler {
        DownloadScheduler::new(self.fetcher.clone())
            .with_config(SchedulerConfig::new(self.config.concurrency))
    }
}
