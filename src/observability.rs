use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations committed.
pub const BOOKINGS_TOTAL: &str = "maitre_bookings_total";

/// Counter: reservations cancelled.
pub const CANCELLATIONS_TOTAL: &str = "maitre_cancellations_total";

/// Counter: booking requests answered from the idempotency cache.
pub const IDEMPOTENT_REPLAYS_TOTAL: &str = "maitre_idempotent_replays_total";

/// Counter: booking requests rejected because the scope lease was held.
pub const LEASE_CONFLICTS_TOTAL: &str = "maitre_lease_conflicts_total";

/// Counter: requests that found zero qualifying candidates.
pub const NO_CAPACITY_TOTAL: &str = "maitre_no_capacity_total";

/// Histogram: discovery latency in seconds.
pub const DISCOVERY_DURATION_SECONDS: &str = "maitre_discovery_duration_seconds";

/// Histogram: candidates produced per discovery.
pub const DISCOVERY_CANDIDATES: &str = "maitre_discovery_candidates";

// ── USE metrics (housekeeping) ──────────────────────────────────

/// Counter: expired leases and idempotency records evicted by the sweeper.
pub const SWEEP_EVICTIONS_TOTAL: &str = "maitre_sweep_evictions_total";

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
