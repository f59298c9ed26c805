//! Batch progress reporting
//!
//! Advances once per completed item, success or failure. Reporting is purely
//! observational; it never feeds back into scheduling.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress of one scheduled batch
#[derive(Debug)]
pub struct BatchProgress {
    bar: ProgressBar,
    total: u64,
    completed: u64,
    failed: u64,
    log_interval: u64,
}

impl BatchProgress {
    /// Create progress for `total` items; the bar is hidden unless `visible`
    pub fn new(total: usize, visible: bool, label: &str, log_interval: usize) -> Self {
        let total = total as u64;
        let bar = if visible {
            create_progress_bar(total, label)
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            total,
            completed: 0,
            failed: 0,
            log_interval: log_interval.max(1) as u64,
        }
    }

    /// Record one completed item
    pub fn tick(&mut self, success: bool) {
        self.completed += 1;
        if !success {
            self.failed += 1;
        }
        self.bar.inc(1);

        if self.completed % self.log_interval == 0 && self.completed < self.total {
            info!(
                completed = self.completed,
                total = self.total,
                failed = self.failed,
                "Download progress"
            );
        }
    }

    /// Items completed so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Close the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn create_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => warn!(error = %e, "Invalid progress template, using default style"),
    }
    pb.set_message(format!("Downloading {label}"));
    pb
}
