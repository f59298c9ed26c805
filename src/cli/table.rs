//! Table command: materialize a dataset and print or save it

use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

use super::{parse_format, Cli, CliError, OutputFormat};
use crate::client::DataClient;
use crate::table::{Cell, Table};
use crate::DistributionFormat;

/// Arguments for the table command
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Dataset identifier
    pub dataset: String,

    /// Date expression: latest, sample, YYYY-MM-DD, YYYYMMDD, or start:end
    #[arg(long)]
    pub dt: Option<String>,

    /// Distribution format to download and decode
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    pub format: DistributionFormat,

    /// Keep only these columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Write the table as CSV to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl TableArgs {
    /// Execute the table command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let client = DataClient::new(cli.client_config()?)?;
        let columns = (!self.columns.is_empty()).then_some(self.columns.as_slice());

        let table = client
            .to_table(
                &self.dataset,
                self.dt.as_deref(),
                self.format.clone(),
                cli.catalog.as_deref(),
                columns,
            )
            .await?;

        if let Some(path) = &self.output {
            table.write_csv_path(path)?;
            info!(path = %path.display(), rows = table.num_rows(), "Table written");
            if cli.output_format == OutputFormat::Human {
                println!("Wrote {} rows to {}", table.num_rows(), path.display());
            }
            return Ok(());
        }

        match cli.output_format {
            OutputFormat::Json => print_json(&table),
            OutputFormat::Human => {
                table.write_csv(std::io::stdout().lock())?;
                Ok(())
            }
        }
    }
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Int(i) => Value::from(*i),
        Cell::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Cell::Str(s) => Value::String(s.clone()),
    }
}

fn print_json(table: &Table) -> Result<(), CliError> {
    let records: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| {
            let object: Map<String, Value> = table
                .columns()
                .iter()
                .cloned()
                .zip(row.iter().map(cell_to_json))
                .collect();
            Value::Object(object)
        })
        .collect();
    let text = serde_json::to_string(&records)
        .map_err(|e| CliError::SerializationError(e.to_string()))?;
    println!("{text}");
    Ok(())
}
