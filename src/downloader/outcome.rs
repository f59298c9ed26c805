//! Per-distribution download outcomes

use std::fmt;
use std::path::{Path, PathBuf};

/// Result of fetching one resolution tuple
///
/// Every tuple handed to the scheduler produces exactly one outcome, success or
/// not. A failure keeps the destination that was attempted so callers can retry
/// only the failed items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The distribution is on disk at `path`
    Success {
        /// Local file holding the distribution
        path: PathBuf,
    },
    /// The fetch failed; nothing valid was written
    Failure {
        /// Destination the fetch would have written
        attempted_path: PathBuf,
        /// Human-readable failure reason
        reason: String,
    },
}

impl DownloadOutcome {
    /// Successful outcome at `path`
    pub fn success(path: impl Into<PathBuf>) -> Self {
        DownloadOutcome::Success { path: path.into() }
    }

    /// Failed outcome for `attempted_path`
    pub fn failure(attempted_path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DownloadOutcome::Failure {
            attempted_path: attempted_path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the distribution is available locally
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    /// Local path, or the attempted path on failure
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::Success { path } => path,
            DownloadOutcome::Failure { attempted_path, .. } => attempted_path,
        }
    }

    /// Failure reason, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            DownloadOutcome::Success { .. } => None,
            DownloadOutcome::Failure { reason, .. } => Some(reason),
        }
    }

    /// `(success, path, error)` view of the outcome
    pub fn as_triple(&self) -> (bool, String, Option<String>) {
        (
            self.is_success(),
            self.path().display().to_string(),
            self.error().map(str::to_string),
        )
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Success { path } => write!(f, "ok      {}", path.display()),
            DownloadOutcome::Failure {
                attempted_path,
                reason,
            } => write!(f, "failed  {} ({})", attempted_path.display(), reason),
        }
    }
}

/// Aggregate counts for one scheduled batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Outcomes that ended in success, reused items included
    pub succeeded: usize,
    /// Outcomes that ended in failure
    pub failed: usize,
    /// Successes satisfied from an existing local file
    pub reused: usize,
}

impl BatchSummary {
    /// Total number of outcomes
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Whether every item succeeded
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}
