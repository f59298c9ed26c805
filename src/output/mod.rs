//! On-disk layout of downloaded distributions

use std::fmt;
use std::str::FromStr;

pub mod path;

pub use path::{ensure_parent_dirs, is_reusable, plan};

/// Output layout errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Unknown partitioning mode
    #[error("invalid partitioning mode '{0}': expected 'flat' or 'hive'")]
    InvalidPartitionMode(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Directory layout used for downloaded files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartitionMode {
    /// One directory, filename encodes dataset, catalog and series
    #[default]
    Flat,
    /// Nested `key=value` directories, one per partition field
    Hive,
}

impl PartitionMode {
    /// Parse an optional mode string; absent or empty means [`PartitionMode::Flat`]
    pub fn parse_optional(mode: Option<&str>) -> OutputResult<Self> {
        match mode.map(str::trim) {
            None | Some("") => Ok(PartitionMode::Flat),
            Some(s) => s.parse(),
        }
    }
}

impl fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionMode::Flat => f.write_str("flat"),
            PartitionMode::Hive => f.write_str("hive"),
        }
    }
}

impl FromStr for PartitionMode {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "flat" => Ok(PartitionMode::Flat),
            "hive" => Ok(PartitionMode::Hive),
            _ => Err(OutputError::InvalidPartitionMode(s.to_string())),
        }
    }
}
