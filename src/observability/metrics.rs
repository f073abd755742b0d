//! Metrics collection and exposition.
//!
//! # Metrics
//! - `coexist_registrations_total` (counter): registration outcomes by `outcome`
//! - `coexist_conflicts_total` (counter): conflict diagnostics emitted
//! - `coexist_registered_versions` (gauge): distinct versions in the live snapshot
//! - `coexist_lookups_total` (counter): lookups by `result`
//! - `coexist_lookup_duration_seconds` (histogram): lookup latency
//! - `coexist_hook_runs_total` (counter): hook runs by `mode` and `result`
//! - `coexist_hook_attempts_total` (counter): async hook attempts
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, CLI)
//! - Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_registration(outcome: &'static str) {
    metrics::counter!("coexist_registrations_total", "outcome" => outcome).increment(1);
}

pub fn record_conflict() {
    metrics::counter!("coexist_conflicts_total").increment(1);
}

pub fn record_registered_versions(count: usize) {
    metrics::gauge!("coexist_registered_versions").set(count as f64);
}

pub fn record_lookup(result: &'static str, start: Instant) {
    metrics::counter!("coexist_lookups_total", "result" => result).increment(1);
    metrics::histogram!("coexist_lookup_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_hook_run(mode: &'static str, result: &'static str) {
    metrics::counter!("coexist_hook_runs_total", "mode" => mode, "result" => result).increment(1);
}

pub fn record_hook_attempt() {
    metrics::counter!("coexist_hook_attempts_total").increment(1);
}
