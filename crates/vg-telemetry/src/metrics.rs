//! Prometheus metrics for the vanish-gate policy.
//!
//! All metrics follow the naming convention: `vg_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Metrics registry for this process
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DECISIONS
    // =========================================================================

    /// Replies sent to the host
    pub static ref DECISIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("vg_policy_decisions_total", "Decisions returned to the relay host"),
        &["action"]  // accept/reject/shadowReject
    ).expect("metric creation failed");

    /// Host lines that could not be decoded
    pub static ref MALFORMED_LINES: IntCounter = IntCounter::new(
        "vg_policy_malformed_lines_total",
        "Host input lines that could not be decoded"
    ).expect("metric creation failed");

    // =========================================================================
    // VANISH REQUESTS
    // =========================================================================

    /// Qualifying vanish requests recorded
    pub static ref VANISH_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("vg_vanish_requests_total", "Vanish requests recorded"),
        &["target"]  // all_relays/relay
    ).expect("metric creation failed");

    /// Remembered senders
    pub static ref CACHE_MEMBERS: IntGauge = IntGauge::new(
        "vg_vanish_cache_members",
        "Senders currently held in the membership cache"
    ).expect("metric creation failed");

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Durable store failures by operation
    pub static ref PERSISTENCE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("vg_store_failures_total", "Durable store failures"),
        &["operation"]  // stream_append/mirror_write
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`].
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DECISIONS.clone()),
        Box::new(MALFORMED_LINES.clone()),
        Box::new(VANISH_REQUESTS.clone()),
        Box::new(CACHE_MEMBERS.clone()),
        Box::new(PERSISTENCE_FAILURES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

pub fn record_decision(action: &str) {
    DECISIONS.with_label_values(&[action]).inc();
}

pub fn record_malformed_line() {
    MALFORMED_LINES.inc();
}

pub fn record_vanish_request(target: &str) {
    VANISH_REQUESTS.with_label_values(&[target]).inc();
}

pub fn record_persistence_failure(operation: &str) {
    record_persistence_failures(operation, 1);
}

pub fn record_persistence_failures(operation: &str, count: u64) {
    PERSISTENCE_FAILURES.with_label_values(&[operation]).inc_by(count);
}

pub fn set_cache_members(members: usize) {
    CACHE_MEMBERS.set(i64::try_from(members).unwrap_or(i64::MAX));
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
