//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Presence updates forwarded to the chat client
//! - Presence updates skipped by rate limiting
//! - Reconnect attempts after a closed channel
//! - Transport failures by operation

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Updates that reached the chat client
pub static UPDATES_FORWARDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "updates_forwarded_total",
            "Total presence updates forwarded to the chat client",
        )
        .namespace("presence_bridge"),
    )
    .expect("Failed to create UPDATES_FORWARDED_TOTAL metric")
});

/// Updates downgraded to no-ops by the minimum-interval rate limiter
pub static UPDATES_SKIPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "updates_skipped_total",
            "Total presence updates skipped by rate limiting",
        )
        .namespace("presence_bridge"),
    )
    .expect("Failed to create UPDATES_SKIPPED_TOTAL metric")
});

/// Reconnect attempts triggered by a closed channel
pub static RECONNECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "reconnects_total",
            "Total reconnect attempts after a closed presence channel",
        )
        .namespace("presence_bridge"),
    )
    .expect("Failed to create RECONNECTS_TOTAL metric")
});

/// Transport failures surfaced to callers, by operation
pub static TRANSPORT_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "transport_failures_total",
            "Total transport failures surfaced to callers",
        )
        .namespace("presence_bridge"),
        &["operation"],
    )
    .expect("Failed to create TRANSPORT_FAILURES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(UPDATES_FORWARDED_TOTAL.clone()))
        .expect("Failed to register UPDATES_FORWARDED_TOTAL");
    registry
        .register(Box::new(UPDATES_SKIPPED_TOTAL.clone()))
        .expect("Failed to register UPDATES_SKIPPED_TOTAL");
    registry
        .register(Box::new(RECONNECTS_TOTAL.clone()))
        .expect("Failed to register RECONNECTS_TOTAL");
    registry
        .register(Box::new(TRANSPORT_FAILURES_TOTAL.clone()))
        .expect("Failed to register TRANSPORT_FAILURES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record a forwarded update
pub fn record_update_forwarded() {
    UPDATES_FORWARDED_TOTAL.inc();
}

/// Helper to record a rate-limited update
pub fn record_update_skipped() {
    UPDATES_SKIPPED_TOTAL.inc();
}

/// Helper to record a reconnect attempt
pub fn record_reconnect() {
    RECONNECTS_TOTAL.inc();
}

/// Helper to record a transport failure
pub fn record_transport_failure(operation: &str) {
    TRANSPORT_FAILURES_TOTAL
        .with_label_values(&[operation])
        .inc();
}
