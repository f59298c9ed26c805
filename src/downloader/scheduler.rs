//! Bounded-concurrency download scheduler
//!
//! Runs one fetch per resolution tuple on a fixed-size pool and returns one
//! outcome per tuple in input order, whatever order the fetches complete in.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

use super::config::SchedulerConfig;
use super::outcome::{BatchSummary, DownloadOutcome};
use super::progress::BatchProgress;
use super::{DownloadError, DownloadResult};
use crate::fetcher::{self, DistributionFetcher};
use crate::metrics::BatchMetrics;
use crate::output::{ensure_parent_dirs, is_reusable, plan, PartitionMode};
use crate::ResolutionTuple;

/// Options for one scheduled batch
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Destination layout
    pub partition_mode: PartitionMode,
    /// Render a progress bar
    pub show_progress: bool,
    /// Re-fetch even when a prior download exists
    pub overwrite: bool,
}

/// Schedules distribution fetches over a bounded worker pool
pub struct DownloadScheduler {
    fetcher: Arc<dyn DistributionFetcher>,
    config: SchedulerConfig,
}

impl DownloadScheduler {
    /// Create a scheduler with default configuration
    pub fn new(fetcher: Arc<dyn DistributionFetcher>) -> Self {
        Self {
            fetcher,
            config: SchedulerConfig::default(),
        }
    }

    /// Replace the scheduler configuration
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Fetch every tuple under `root_dir`
    ///
    /// # Returns
    /// One outcome per tuple, in input order. Individual fetch failures are
    /// outcomes, not errors.
    ///
    /// # Errors
    /// [`DownloadError::Filesystem`] when a destination directory cannot be
    /// created; no fetch is attempted in that case.
    pub async fn run(
        &self,
        tuples: &[ResolutionTuple],
        root_dir: &Path,
        options: BatchOptions,
    ) -> DownloadResult<Vec<DownloadOutcome>> {
        let (outcomes, _) = self.run_with_summary(tuples, root_dir, options).await?;
        Ok(outcomes)
    }

    /// Like [`Self::run`], also returning aggregate counts
    pub async fn run_with_summary(
        &self,
        tuples: &[ResolutionTuple],
        root_dir: &Path,
        options: BatchOptions,
    ) -> DownloadResult<(Vec<DownloadOutcome>, BatchSummary)> {
        if tuples.is_empty() {
            return Ok((Vec::new(), BatchSummary::default()));
        }

        let label = batch_label(tuples);
        let span = info_span!(
            "download_batch",
            dataset = %label,
            total = tuples.len(),
            root = %root_dir.display(),
            mode = %options.partition_mode,
        );
        self.execute(tuples, root_dir, options, &label)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        tuples: &[ResolutionTuple],
        root_dir: &Path,
        options: BatchOptions,
        label: &str,
    ) -> DownloadResult<(Vec<DownloadOutcome>, BatchSummary)> {
        let planned: Vec<PathBuf> = tuples
            .iter()
            .map(|tuple| plan(tuple, root_dir, options.partition_mode))
            .collect();
        prepare_directories(&planned)?;

        let metrics = BatchMetrics::start(label, tuples.len());
        let mut progress = BatchProgress::new(
            tuples.len(),
            options.show_progress,
            label,
            self.config.progress_log_interval(),
        );
        let mut slots: Vec<Option<DownloadOutcome>> = vec![None; tuples.len()];
        let mut summary = BatchSummary::default();
        let mut pending = Vec::new();
        let mut claimed: HashMap<&Path, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (idx, (tuple, path)) in tuples.iter().zip(&planned).enumerate() {
            if tuple.is_sample() {
                // Single-shot export, always refreshed
                let outcome = fetcher::fetch(self.fetcher.as_ref(), tuple, path).await;
                record(&metrics, &mut progress, &mut summary, tuple, &outcome, false);
                slots[idx] = Some(outcome);
            } else if !options.overwrite && is_reusable(path) {
                let outcome = DownloadOutcome::success(path.clone());
                record(&metrics, &mut progress, &mut summary, tuple, &outcome, true);
                slots[idx] = Some(outcome);
            } else if let Some(&first) = claimed.get(path.as_path()) {
                // Same destination twice: fetch once, share the outcome
                duplicates.push((idx, first));
            } else {
                claimed.insert(path.as_path(), idx);
                pending.push((idx, tuple, path.clone()));
            }
        }

        let source = self.fetcher.as_ref();
        let mut completed = stream::iter(pending)
            .map(|(idx, tuple, path)| async move {
                let outcome = fetcher::fetch(source, tuple, &path).await;
                (idx, outcome)
            })
            .buffer_unordered(self.config.concurrency());

        while let Some((idx, outcome)) = completed.next().await {
            record(&metrics, &mut progress, &mut summary, &tuples[idx], &outcome, false);
            slots[idx] = Some(outcome);
        }
        for (idx, first) in duplicates {
            if let Some(outcome) = slots[first].clone() {
                let reused = outcome.is_success();
                record(&metrics, &mut progress, &mut summary, &tuples[idx], &outcome, reused);
                slots[idx] = Some(outcome);
            }
        }
        progress.finish();

        let outcomes = slots
            .into_iter()
            .zip(planned)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| DownloadOutcome::failure(path, "no outcome recorded"))
            })
            .collect();

        metrics.finish(summary.succeeded, summary.failed, summary.reused);
        Ok((outcomes, summary))
    }
}

fn prepare_directories(planned: &[PathBuf]) -> DownloadResult<()> {
    let mut seen = HashSet::new();
    for path in planned {
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if seen.insert(parent) {
            ensure_parent_dirs(path).map_err(DownloadError::Filesystem)?;
        }
    }
    Ok(())
}

fn record(
    metrics: &BatchMetrics,
    progress: &mut BatchProgress,
    summary: &mut BatchSummary,
    tuple: &ResolutionTuple,
    outcome: &DownloadOutcome,
    reused: bool,
) {
    match outcome {
        DownloadOutcome::Success { path } => {
            summary.succeeded += 1;
            if reused {
                summary.reused += 1;
                metrics.record_reused();
                debug!(tuple = %tuple, path = %path.display(), "Reusing existing download");
            } else {
                metrics.record_downloaded();
                debug!(tuple = %tuple, path = %path.display(), "Downloaded distribution");
            }
        }
        DownloadOutcome::Failure {
            attempted_path,
            reason,
        } => {
            summary.failed += 1;
            metrics.record_failed();
            warn!(
                tuple = %tuple,
                path = %attempted_path.display(),
                error = %reason,
                "Distribution download failed"
            );
        }
    }
    progress.tick(outcome.is_success());
}

fn batch_label(tuples: &[ResolutionTuple]) -> String {
    match tuples.first() {
        Some(first) if tuples.iter().all(|t| t.dataset == first.dataset) => first.dataset.clone(),
        Some(_) => "mixed".to_string(),
        None => String::new(),
    }
}
