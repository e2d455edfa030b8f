use std::net::SocketAddr;

use crate::engine::Rejection;

// ── API calls ───────────────────────────────────────────────────

/// Counter: requests sent to the remote API. Labels: operation, status.
pub const API_REQUESTS_TOTAL: &str = "holidaze_api_requests_total";

/// Histogram: request latency in seconds. Labels: operation.
pub const API_REQUEST_DURATION_SECONDS: &str = "holidaze_api_request_duration_seconds";

// ── Availability engine ─────────────────────────────────────────

/// Counter: stay validations. Labels: outcome.
pub const BOOKING_VALIDATIONS_TOTAL: &str = "holidaze_booking_validations_total";

/// Counter: availability index rebuilds (one per venue refresh).
pub const INDEX_REBUILDS_TOTAL: &str = "holidaze_index_rebuilds_total";

/// Gauge: venue snapshots held in memory.
pub const SNAPSHOTS_CACHED: &str = "holidaze_snapshots_cached";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Label for a validation outcome.
pub fn outcome_label(reason: Option<Rejection>) -> &'static str {
    match reason {
        None => "accepted",
        Some(reason) => reason.as_str(),
    }
}
