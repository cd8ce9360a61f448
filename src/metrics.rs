//! Scrape metrics
//!
//! Counters and histograms are recorded through the `metrics` facade. When the
//! Prometheus recorder is installed the server exposes them at `/metrics`, and
//! a configured metrics port gets the exporter's own HTTP listener as well.

use metrics::{counter, histogram, set_global_recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const SCRAPES: &str = "fights_scrapes_total";
const SCRAPE_ERRORS: &str = "fights_scrape_errors_total";
const RECORDS: &str = "fights_records_total";
const CANDIDATE_FAILURES: &str = "fights_candidate_failures_total";
const COLLECTOR_TIMEOUTS: &str = "fights_collector_timeouts_total";
const FETCH_BYTES: &str = "fights_fetch_bytes";
const SCRAPE_DURATION: &str = "fights_scrape_duration_seconds";

/// Install the Prometheus recorder, plus an exporter HTTP listener on
/// `listen` when given. Must run inside the tokio runtime. Idempotent; later
/// calls return the existing handle.
pub fn init_metrics(listen: Option<SocketAddr>) -> Option<PrometheusHandle> {
    if let Some(handle) = HANDLE.get() {
        return Some(handle.clone());
    }

    let installed = match listen {
        Some(addr) => install_with_listener(addr),
        None => PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| e.to_string()),
    };

    match installed {
        Ok(handle) => {
            ParserMetrics::register_metrics();
            info!("Prometheus recorder installed");
            Some(HANDLE.get_or_init(|| handle).clone())
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    }
}

fn install_with_listener(addr: SocketAddr) -> Result<PrometheusHandle, String> {
    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| e.to_string())?;
    let handle = recorder.handle();
    set_global_recorder(recorder)
        .map_err(|_| "a metrics recorder is already installed".to_string())?;

    tokio::spawn(async move {
        // ExporterError implements neither Debug nor Display in this exporter version
        if exporter.await.is_err() {
            warn!("Prometheus exporter stopped");
        }
    });
    info!("Prometheus exporter listening on http://{}/metrics", addr);
    Ok(handle)
}

/// Metrics recorded by the fight parser
pub struct ParserMetrics;

impl ParserMetrics {
    /// Pre-register so every series shows up before first use
    pub fn register_metrics() {
        let _ = counter!(SCRAPES);
        let _ = counter!(SCRAPE_ERRORS);
        let _ = counter!(RECORDS);
        let _ = counter!(CANDIDATE_FAILURES);
        let _ = counter!(COLLECTOR_TIMEOUTS);
        let _ = histogram!(FETCH_BYTES);
        let _ = histogram!(SCRAPE_DURATION);
    }

    pub fn record_scrape_success(records: usize, duration_secs: f64) {
        counter!(SCRAPES).increment(1);
        counter!(RECORDS).increment(records as u64);
        histogram!(SCRAPE_DURATION).record(duration_secs);
    }

    pub fn record_scrape_error() {
        counter!(SCRAPES).increment(1);
        counter!(SCRAPE_ERRORS).increment(1);
    }

    pub fn record_fetch_bytes(bytes: usize) {
        histogram!(FETCH_BYTES).record(bytes as f64);
    }

    pub fn record_candidate_failure() {
        counter!(CANDIDATE_FAILURES).increment(1);
    }

    pub fn record_collector_timeout() {
        counter!(COLLECTOR_TIMEOUTS).increment(1);
    }
}
