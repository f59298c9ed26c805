//! CLI error types and conversions

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::table::TableError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Client operation failed
    #[error("{0}")]
    ClientError(#[from] ClientError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Table output failed
    #[error("table error: {0}")]
    TableError(#[from] TableError),

    /// Some distributions could not be downloaded
    #[error("{failed} of {total} distributions failed to download")]
    IncompleteBatch {
        /// Failed outcomes
        failed: usize,
        /// All outcomes
        total: usize,
    },

    /// Result could not be serialized
    #[error("serialization error: {0}")]
    SerializationError(String),
}
