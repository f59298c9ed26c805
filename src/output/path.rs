//! Destination path planning for downloaded distributions
//!
//! Paths are a pure function of the resolution tuple, the download root and
//! the [`PartitionMode`], so a re-run computes the same destination and can
//! detect a prior download there.
//!
//! # Layouts
//!
//! - Flat: `{root}/{dataset}__{catalog}__{series}.{format}`
//! - Hive: `{root}/dataset={dataset}/catalog={catalog}/series={series}/data.{format}`
//!
//! # Usage Example
//!
//! ```rust
//! use catalog_data_downloader::output::{plan, PartitionMode};
//! use catalog_data_downloader::{DistributionFormat, ResolutionTuple};
//! use std::path::{Path, PathBuf};
//!
//! let tuple = ResolutionTuple::new("common", "FX", "2020-01-01", DistributionFormat::Csv);
//!
//! assert_eq!(
//!     plan(&tuple, Path::new("downloads"), PartitionMode::Flat),
//!     PathBuf::from("downloads/FX__common__2020-01-01.csv")
//! );
//! assert_eq!(
//!     plan(&tuple, Path::new("downloads"), PartitionMode::Hive),
//!     PathBuf::from("downloads/dataset=FX/catalog=common/series=2020-01-01/data.csv")
//! );
//! ```

use super::{OutputError, OutputResult, PartitionMode};
use crate::ResolutionTuple;
use std::path::{Path, PathBuf};

/// Filename stem used inside a hive partition directory
pub const HIVE_FILE_STEM: &str = "data";

/// Compute the destination of `tuple` under `root_dir`
pub fn plan(tuple: &ResolutionTuple, root_dir: &Path, mode: PartitionMode) -> PathBuf {
    let dataset = sanitize_component(&tuple.dataset);
    let catalog = sanitize_component(&tuple.catalog);
    let series = sanitize_component(tuple.series_id());
    let format = sanitize_component(tuple.format.as_str());

    match mode {
        PartitionMode::Flat => {
            root_dir.join(format!("{dataset}__{catalog}__{series}.{format}"))
        }
        PartitionMode::Hive => root_dir
            .join(format!("dataset={dataset}"))
            .join(format!("catalog={catalog}"))
            .join(format!("series={series}"))
            .join(format!("{HIVE_FILE_STEM}.{format}")),
    }
}

/// Whether `path` holds a prior download that can be reused
///
/// Only a regular, non-empty file qualifies.
pub fn is_reusable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Create the parent directory of `path`
pub fn ensure_parent_dirs(path: &Path) -> OutputResult<()> {
    let Some(dir_path) = path.parent() else {
        return Ok(());
    };
    if dir_path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir_path).map_err(|e| {
        OutputError::IoError(format!(
            "Failed to create directory {}: {}",
            dir_path.display(),
            e
        ))
    })
}

/// Sanitize one path component for filesystem safety
///
/// Replaces `..`, `/` and `\` with `_` so an identifier can never climb out
/// of the download root or introduce extra directory levels.
fn sanitize_component(name: &str) -> String {
    name.replace("..", "_").replace(['/', '\\'], "_")
}
