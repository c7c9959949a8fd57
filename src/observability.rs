use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total slot queries served.
pub const SLOT_QUERIES_TOTAL: &str = "rendez_slot_queries_total";

/// Histogram: slot query latency in seconds.
pub const SLOT_QUERY_DURATION_SECONDS: &str = "rendez_slot_query_duration_seconds";

/// Histogram: slots emitted per query.
pub const SLOTS_PER_QUERY: &str = "rendez_slots_per_query";

/// Counter: reservations attempted. Labels: status.
pub const RESERVATIONS_TOTAL: &str = "rendez_reservations_total";

/// Counter: cancellations (including idempotent no-ops).
pub const CANCELLATIONS_TOTAL: &str = "rendez_cancellations_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: resources currently registered.
pub const RESOURCES_ACTIVE: &str = "rendez_resources_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the fmt tracing subscriber for embedders that have none.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
