//! CLI command implementations

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::ClientConfig;
use crate::downloader::MAX_CONCURRENCY;
use crate::output::PartitionMode;
use crate::DistributionFormat;

pub mod download;
pub mod error;
pub mod series;
pub mod table;

pub use download::DownloadArgs;
pub use error::CliError;
pub use series::SeriesArgs;
pub use table::TableArgs;

/// Catalog Data Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "catalog-data-downloader")]
#[command(about = "Resolve, download and materialize dataset distributions from a data catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file (defaults and CATALOG_* environment variables still apply)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog service root URL
    #[arg(long, global = true)]
    pub root_url: Option<String>,

    /// Catalog to use (default: "common")
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Root directory for downloaded files (default: "downloads")
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Number of concurrent downloads (default: 10, max: 64)
    #[arg(long, global = true, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Expose Prometheus metrics on this address (e.g., 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download distributions of a dataset
    Download(DownloadArgs),

    /// Download and print or save a dataset as one table
    Table(TableArgs),

    /// List the series members of a dataset
    Series(SeriesArgs),
}

impl Cli {
    /// Layer command-line flags over file and environment configuration
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.root_url {
            config.root_url = url.clone();
        }
        if let Some(catalog) = &self.catalog {
            config.default_catalog = catalog.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config.validate()?;
        Ok(config)
    }

    /// Run the selected command
    pub async fn execute(&self) -> Result<(), CliError> {
        match &self.command {
            Commands::Download(args) => args.execute(self).await,
            Commands::Table(args) => args.execute(self).await,
            Commands::Series(args) => args.execute(self).await,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Parse a distribution format flag
pub(crate) fn parse_format(s: &str) -> Result<DistributionFormat, String> {
    DistributionFormat::from_str(s)
}

/// Parse a partitioning flag
pub(crate) fn parse_partitioning(s: &str) -> Result<PartitionMode, String> {
    PartitionMode::from_str(s).map_err(|e| e.to_string())
}
