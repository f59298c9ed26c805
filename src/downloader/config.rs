//! Scheduler configuration

/// Default number of concurrent fetches
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Maximum allowed concurrency to keep the pool within transport capacity
pub const MAX_CONCURRENCY: usize = 64;

/// Log a progress line every N completed items
pub const DEFAULT_PROGRESS_LOG_INTERVAL: usize = 25;

/// Tunables for [`super::DownloadScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    concurrency: usize,
    progress_log_interval: usize,
}

impl SchedulerConfig {
    /// Create a config with the given worker count, clamped to `1..=MAX_CONCURRENCY`
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: clamp_concurrency(concurrency),
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
        }
    }

    /// Set how many completed items pass between progress log lines
    pub fn with_progress_log_interval(mut self, interval: usize) -> Self {
        self.progress_log_interval = interval.max(1);
        self
    }

    /// Worker-pool size
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Completed items between progress log lines
    pub fn progress_log_interval(&self) -> usize {
        self.progress_log_interval
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

/// Clamp a requested worker count into the supported range
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, MAX_CONCURRENCY)
}
