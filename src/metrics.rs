//! Observability metrics for distribution downloads
//!
//! Counters per outcome kind plus a fetch-duration histogram, recorded through
//! the `metrics` facade. Nothing is exported unless [`init_metrics`] installs
//! the Prometheus listener; without it every recording is a cheap no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Counter of distributions fetched from the service
pub const DOWNLOADED_TOTAL: &str = "distributions_downloaded_total";
/// Counter of distributions whose fetch failed
pub const FAILED_TOTAL: &str = "distributions_failed_total";
/// Counter of distributions reused from a prior download
pub const REUSED_TOTAL: &str = "distributions_reused_total";
/// Histogram of single-fetch wall time
pub const FETCH_DURATION_SECONDS: &str = "distribution_fetch_duration_seconds";

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls after a successful one do nothing.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!(addr = %addr, "Initializing metrics system");

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        DOWNLOADED_TOTAL,
        Unit::Count,
        "Total number of distributions fetched from the catalog service"
    );

    describe_counter!(
        FAILED_TOTAL,
        Unit::Count,
        "Total number of distribution fetches that failed"
    );

    describe_counter!(
        REUSED_TOTAL,
        Unit::Count,
        "Total number of distributions reused from an existing local file"
    );

    describe_histogram!(
        FETCH_DURATION_SECONDS,
        Unit::Seconds,
        "Wall time of one distribution fetch in seconds"
    );

    *initialized = true;
    info!(addr = %addr, "Metrics system initialized successfully");
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Per-fetch recording helpers
pub struct FetchMetrics;

impl FetchMetrics {
    /// Record the wall time of one completed fetch
    pub fn record_fetch_duration(duration: Duration) {
        histogram!(FETCH_DURATION_SECONDS).record(duration.as_secs_f64());
    }
}

/// Batch-level metrics for one dataset download
pub struct BatchMetrics {
    dataset: String,
    start_time: Instant,
}

impl BatchMetrics {
    /// Start tracking a batch
    pub fn start(dataset: impl Into<String>, total: usize) -> Self {
        let dataset = dataset.into();

        info!(dataset = %dataset, total = total, "Download batch started");

        Self {
            dataset,
            start_time: Instant::now(),
        }
    }

    /// Record a distribution fetched from the service
    pub fn record_downloaded(&self) {
        counter!(DOWNLOADED_TOTAL, "dataset" => self.dataset.clone()).increment(1);
    }

    /// Record a distribution reused from disk
    pub fn record_reused(&self) {
        counter!(REUSED_TOTAL, "dataset" => self.dataset.clone()).increment(1);
    }

    /// Record a failed distribution fetch
    pub fn record_failed(&self) {
        counter!(FAILED_TOTAL, "dataset" => self.dataset.clone()).increment(1);
    }

    /// Log batch completion
    pub fn finish(&self, succeeded: usize, failed: usize, reused: usize) {
        let duration = self.start_time.elapsed();
        if failed > 0 {
            warn!(
                dataset = %self.dataset,
                succeeded = succeeded,
                failed = failed,
                reused = reused,
                duration_ms = duration.as_millis(),
                "Download batch finished with failures"
            );
        } else {
            info!(
                dataset = %self.dataset,
                succeeded = succeeded,
                reused = reused,
                duration_ms = duration.as_millis(),
                "Download batch finished"
            );
        }
    }
}
