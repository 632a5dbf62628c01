//! Metrics definitions for the room client.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rc_` prefix for the room client
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use signaling_protocol::SignalKind;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime, before any metrics are
/// recorded.
///
/// # Errors
///
/// Returns error if the recorder is already installed or the listener
/// cannot be bound.
pub fn init_metrics_exporter(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        // Discovery is a single HTTPS round trip to a public dispatcher
        .set_buckets_for_metric(
            Matcher::Prefix("rc_discovery".to_string()),
            &[
                0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set discovery buckets: {e}"))?
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

// ============================================================================
// Discovery
// ============================================================================

/// Record a discovery attempt.
///
/// Emits:
/// - `rc_discovery_total` counter (labels: `status`)
/// - `rc_discovery_duration_seconds` histogram (no labels)
/// - `rc_discovery_failures_total` counter (labels: `error_type`, on failure only)
pub fn record_discovery(status: &str, error_type: Option<&str>, duration: Duration) {
    histogram!("rc_discovery_duration_seconds").record(duration.as_secs_f64());

    counter!("rc_discovery_total", "status" => status.to_string()).increment(1);

    if let Some(err_type) = error_type {
        counter!("rc_discovery_failures_total",
            "error_type" => err_type.to_string()
        )
        .increment(1);
    }
}

// ============================================================================
// Session
// ============================================================================

/// Record a `connect()` outcome.
///
/// Metric: `rc_connect_attempts_total`
/// Labels: `status` (success, or the error kind)
pub fn record_connect_attempt(status: &str) {
    counter!("rc_connect_attempts_total", "status" => status.to_string()).increment(1);
}

/// Record an inbound signal reaching the dispatch table.
///
/// Metric: `rc_signals_received_total`
/// Labels: `kind`
pub fn record_signal_received(kind: SignalKind) {
    counter!("rc_signals_received_total", "kind" => kind.as_str()).increment(1);
}

/// Record an outbound signal queued for the transport.
///
/// Metric: `rc_signals_sent_total`
/// Labels: `event`
pub fn record_signal_sent(event: &'static str) {
    counter!("rc_signals_sent_total", "event" => event).increment(1);
}

/// Metric: `rc_keepalive_pings_total`
pub fn record_keepalive_ping() {
    counter!("rc_keepalive_pings_total").increment(1);
}
