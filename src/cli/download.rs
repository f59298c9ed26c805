//! Download command implementation

use clap::Args;
use tracing::info;

use super::{parse_format, parse_partitioning, Cli, CliError, OutputFormat};
use crate::client::{DataClient, DownloadRequest};
use crate::downloader::DownloadOutcome;
use crate::output::PartitionMode;
use crate::DistributionFormat;

/// Arguments for downloading distributions
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Dataset identifier (e.g., FX_SPOT_RATES)
    pub dataset: String,

    /// Date expression: latest, sample, YYYY-MM-DD, YYYYMMDD, or start:end
    #[arg(long)]
    pub dt: Option<String>,

    /// Distribution format (csv, psv, parquet, json, ...)
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    pub format: DistributionFormat,

    /// Directory layout: flat or hive
    #[arg(long, default_value = "flat", value_parser = parse_partitioning)]
    pub partitioning: PartitionMode,

    /// Re-download files that already exist
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl DownloadArgs {
    /// Execute the download
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = cli.client_config()?;
        let client = DataClient::new(config)?;

        let request = DownloadRequest {
            dataset: self.dataset.clone(),
            dt: self.dt.clone(),
            format: self.format.clone(),
            catalog: cli.catalog.clone(),
            download_dir: None,
            partitioning: self.partitioning,
            return_paths: true,
            show_progress: !self.no_progress && cli.output_format == OutputFormat::Human,
            overwrite: self.overwrite,
        };

        info!(
            dataset = %self.dataset,
            dt = self.dt.as_deref().unwrap_or("latest"),
            format = %self.format,
            "Starting download"
        );
        let outcomes = client.download(&request).await?.unwrap_or_default();

        match cli.output_format {
            OutputFormat::Json => output_json(&outcomes)?,
            OutputFormat::Human => output_human(&self.dataset, &outcomes),
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            return Err(CliError::IncompleteBatch {
                failed,
                total: outcomes.len(),
            });
        }
        Ok(())
    }
}

/// Print one JSON object per outcome, as an array
fn output_json(outcomes: &[DownloadOutcome]) -> Result<(), CliError> {
    let rows: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|outcome| {
            let (success, path, error) = outcome.as_triple();
            serde_json::json!({
                "success": success,
                "path": path,
                "error": error,
            })
        })
        .collect();
    let text = serde_json::to_string(&rows)
        .map_err(|e| CliError::SerializationError(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn output_human(dataset: &str, outcomes: &[DownloadOutcome]) {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    for outcome in outcomes {
        println!("{outcome}");
    }
    println!(
        "\n{}: {} of {} distributions available locally",
        dataset,
        succeeded,
        outcomes.len()
    );
}
