use std::net::SocketAddr;

// ── Store metrics ───────────────────────────────────────────────

/// Counter: committed store mutations. Labels: op.
pub const MUTATIONS_TOTAL: &str = "unfold_mutations_total";

/// Counter: mutations rejected by validation. Labels: op.
pub const MUTATIONS_REJECTED_TOTAL: &str = "unfold_mutations_rejected_total";

/// Gauge: events in the collection.
pub const EVENTS_ACTIVE: &str = "unfold_events_active";

/// Gauge: saved daily templates.
pub const TEMPLATES_ACTIVE: &str = "unfold_templates_active";

// ── Persistence metrics ─────────────────────────────────────────

/// Counter: best-effort writes that failed. Labels: key.
pub const PERSIST_FAILURES_TOTAL: &str = "unfold_persist_failures_total";

/// Counter: persisted blobs discarded as malformed on load. Labels: key.
pub const LOAD_DISCARDED_TOTAL: &str = "unfold_load_discarded_total";

/// Counter: backup imports rejected as a whole.
pub const IMPORTS_REJECTED_TOTAL: &str = "unfold_imports_rejected_total";

// ── Ticker metrics ──────────────────────────────────────────────

/// Counter: frames computed by the ticker.
pub const FRAMES_TOTAL: &str = "unfold_frames_total";

/// Histogram: frame computation time in seconds.
pub const FRAME_DURATION_SECONDS: &str = "unfold_frame_duration_seconds";

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

