//! Prometheus metrics for transync
//!
//! This module provides metrics tracking for:
//! - Cache: lookups by product and outcome
//! - Warm-up: which source populated the cache, and how long it took
//! - Sync: periodic resync outcomes
//! - Remote: translation service calls by endpoint and outcome
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! Until then (or if initialization fails) every record function is a no-op.

use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all client metrics
struct ClientMetrics {
    cache_lookups: CounterVec,
    warm_ups: CounterVec,
    warm_up_duration: HistogramVec,
    syncs: CounterVec,
    remote_fetches: CounterVec,
}

/// Global storage for client metrics
static CLIENT_METRICS: OnceLock<ClientMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = transync::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = ClientMetrics {
        cache_lookups: register_counter_vec!(
            "transync_cache_lookups_total",
            "Cache lookups by product and result",
            &["product", "result"]
        )?,
        warm_ups: register_counter_vec!(
            "transync_warm_ups_total",
            "Cache loads by product and the source that supplied the data",
            &["product", "source"]
        )?,
        warm_up_duration: register_histogram_vec!(
            "transync_warm_up_duration_seconds",
            "Time spent loading a product's translations in seconds",
            &["product"],
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
        )?,
        syncs: register_counter_vec!(
            "transync_syncs_total",
            "Periodic cache syncs by product and status",
            &["product", "status"]
        )?,
        remote_fetches: register_counter_vec!(
            "transync_remote_fetches_total",
            "Translation service calls by endpoint and status",
            &["endpoint", "status"]
        )?,
    };

    CLIENT_METRICS
        .set(metrics)
        .map_err(|_| "Client metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    CLIENT_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

/// Record a cache lookup
pub fn record_cache_lookup(product: &str, hit: bool) {
    if let Some(m) = CLIENT_METRICS.get() {
        let result = if hit { "hit" } else { "miss" };
        m.cache_lookups.with_label_values(&[product, result]).inc();
    }
}

/// Record a cache load; `source` is `server`, `bundle` or `failed`
pub fn record_warm_up(product: &str, source: &str, duration_secs: f64) {
    let Some(m) = CLIENT_METRICS.get() else {
        return;
    };

    m.warm_ups.with_label_values(&[product, source]).inc();
    m.warm_up_duration
        .with_label_values(&[product])
        .observe(duration_secs);
}

/// Record a periodic sync outcome
pub fn record_sync(product: &str, success: bool) {
    if let Some(m) = CLIENT_METRICS.get() {
        m.syncs
            .with_label_values(&[product, status_label(success)])
            .inc();
    }
}

/// Record a translation service call
pub fn record_remote_fetch(endpoint: &str, success: bool) {
    if let Some(m) = CLIENT_METRICS.get() {
        m.remote_fetches
            .with_label_values(&[endpoint, status_label(success)])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        record_cache_lookup("Acme", true);
        record_warm_up("Acme", "bundle", 0.2);
        record_sync("Acme", false);
        record_remote_fetch("localelist", true);
    }

    #[test]
    fn test_init_and_encode() {
        init_metrics().unwrap();
        // A second call is a no-op
        init_metrics().unwrap();
        assert!(metrics_initialized());

        record_cache_lookup("Acme", false);
        record_remote_fetch("componentlist", false);

        let text = encode_metrics().unwrap();
        assert!(text.contains("transync_cache_lookups_total"));
        assert!(text.contains("transync_remote_fetches_total"));
    }
}
