//! Prometheus metrics for tryon-service.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static TRYON_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Provider metrics
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Product image fetch metrics
pub static IMAGE_FETCH_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static IMAGE_FETCH_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("tryon_requests_total", "Total try-on requests by outcome"),
        &["outcome"],
    )
    .expect("Failed to create tryon_requests_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "tryon_provider_latency_seconds",
            "AI provider API latency in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )
    .expect("Failed to create tryon_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("tryon_provider_errors_total", "Total AI provider errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create tryon_provider_errors_total metric");

    let fetch_duration = HistogramVec::new(
        HistogramOpts::new(
            "tryon_image_fetch_duration_seconds",
            "Product image fetch duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["status"],
    )
    .expect("Failed to create tryon_image_fetch_duration_seconds metric");

    let fetch_errors = IntCounterVec::new(
        Opts::new(
            "tryon_image_fetch_errors_total",
            "Total product image fetch errors",
        ),
        &["error_type"],
    )
    .expect("Failed to create tryon_image_fetch_errors_total metric");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register tryon_requests_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register tryon_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register tryon_provider_errors_total");
    registry
        .register(Box::new(fetch_duration.clone()))
        .expect("Failed to register tryon_image_fetch_duration_seconds");
    registry
        .register(Box::new(fetch_errors.clone()))
        .expect("Failed to register tryon_image_fetch_errors_total");

    let _ = REGISTRY.set(registry);
    let _ = TRYON_REQUESTS_TOTAL.set(requests_total);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = IMAGE_FETCH_DURATION_SECONDS.set(fetch_duration);
    let _ = IMAGE_FETCH_ERRORS_TOTAL.set(fetch_errors);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record the outcome of a try-on request.
pub fn record_request(outcome: &str) {
    if let Some(counter) = TRYON_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record a product image fetch.
pub fn record_image_fetch(status: &str, duration_secs: f64) {
    if let Some(histogram) = IMAGE_FETCH_DURATION_SECONDS.get() {
        histogram.with_label_values(&[status]).observe(duration_secs);
    }
}

/// Record a product image fetch error.
pub fn record_image_fetch_error(error_type: &str) {
    if let Some(counter) = IMAGE_FETCH_ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type]).inc();
    }
}
