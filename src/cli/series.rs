//! Series command: list the dated members of a dataset

use clap::Args;

use super::{Cli, CliError, OutputFormat};
use crate::client::DataClient;

/// Arguments for the series command
#[derive(Args, Debug)]
pub struct SeriesArgs {
    /// Dataset identifier
    pub dataset: String,
}

impl SeriesArgs {
    /// Execute the series listing
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let client = DataClient::new(cli.client_config()?)?;
        let mut members = client
            .list_series(cli.catalog.as_deref(), &self.dataset)
            .await?;
        members.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        match cli.output_format {
            OutputFormat::Json => {
                let text = serde_json::to_string(&members)
                    .map_err(|e| CliError::SerializationError(e.to_string()))?;
                println!("{text}");
            }
            OutputFormat::Human => {
                for member in &members {
                    println!(
                        "{:<12} {}",
                        member.identifier,
                        member.created_date.as_deref().unwrap_or("-")
                    );
                }
                println!("\n{} series in {}", members.len(), self.dataset);
            }
        }
        Ok(())
    }
}
