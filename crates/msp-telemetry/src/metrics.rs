//! Prometheus metrics for the identity caches and the alias registry.
//!
//! All metrics follow the naming convention: `msp_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: cache lookups, evictions, resets and alias commits
//! - **Histogram**: time producers waited for alias channel capacity

use lazy_static::lazy_static;
use msp_cache::metrics::{CacheKind, CommitOutcome, MetricsRecorder};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // IDENTITY CACHE METRICS
    // =========================================================================

    /// Cache lookups by cache and result
    pub static ref CACHE_LOOKUPS: IntCounterVec = IntCounterVec::new(
        Opts::new("msp_cache_lookups_total", "Identity cache lookups"),
        &["cache", "result"]  // result: hit/miss
    ).expect("metric creation failed");

    /// Entries evicted to make room
    pub static ref CACHE_EVICTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("msp_cache_evictions_total", "Identity cache evictions"),
        &["cache"]
    ).expect("metric creation failed");

    /// Whole-cache resets caused by provider setup
    pub static ref CACHE_RESETS: IntCounter = IntCounter::new(
        "msp_cache_resets_total",
        "Identity caches discarded by provider reconfiguration"
    ).expect("metric creation failed");

    // =========================================================================
    // ALIAS REGISTRY METRICS
    // =========================================================================

    /// Time spent waiting for channel capacity
    pub static ref ALIAS_SUBMIT_WAIT: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "msp_alias_submit_wait_seconds",
            "Time producers waited for alias channel capacity"
        ).buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0, 10.0])
    ).expect("metric creation failed");

    /// Position records processed by the consumer
    pub static ref ALIAS_COMMITS: IntCounterVec = IntCounterVec::new(
        Opts::new("msp_alias_commits_total", "Position records processed by the alias consumer"),
        &["outcome"]  // outcome: inserted/replaced/skipped
    ).expect("metric creation failed");

    /// Registry clears
    pub static ref ALIAS_REGISTRY_CLEARS: IntCounter = IntCounter::new(
        "msp_alias_registry_clears_total",
        "Alias registry clears"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_EVICTIONS.clone()),
        Box::new(CACHE_RESETS.clone()),
        Box::new(ALIAS_SUBMIT_WAIT.clone()),
        Box::new(ALIAS_COMMITS.clone()),
        Box::new(ALIAS_REGISTRY_CLEARS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// [`MetricsRecorder`] that feeds the global Prometheus collectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusRecorder;

impl MetricsRecorder for PrometheusRecorder {
    fn record_lookup(&self, kind: CacheKind, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        CACHE_LOOKUPS
            .with_label_values(&[kind.as_str(), result])
            .inc();
    }

    fn record_eviction(&self, kind: CacheKind) {
        CACHE_EVICTIONS.with_label_values(&[kind.as_str()]).inc();
    }

    fn record_cache_reset(&self) {
        CACHE_RESETS.inc();
    }

    fn record_position_submitted(&self, waited: Duration) {
        ALIAS_SUBMIT_WAIT.observe(waited.as_secs_f64());
    }

    fn record_position_committed(&self, outcome: CommitOutcome) {
        ALIAS_COMMITS.with_label_values(&[outcome.as_str()]).inc();
    }

    fn record_registry_cleared(&self) {
        ALIAS_REGISTRY_CLEARS.inc();
    }
}
