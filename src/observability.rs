use std::net::SocketAddr;
use std::time::Instant;

use crate::scheduler::SchedulerError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: scheduler operations. Labels: operation, status.
pub const OPERATIONS_TOTAL: &str = "roombook_operations_total";

/// Histogram: scheduler operation latency in seconds. Labels: operation.
pub const OPERATION_DURATION_SECONDS: &str = "roombook_operation_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: reservations currently held by the store.
pub const RESERVATIONS_ACTIVE: &str = "roombook_reservations_active";

/// Histogram: WAL append + fsync duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "roombook_wal_flush_duration_seconds";

/// Counter: completed WAL compactions.
pub const WAL_COMPACTIONS_TOTAL: &str = "roombook_wal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Count and time one scheduler operation. Failures are labelled by error kind.
pub fn record_operation<T>(
    operation: &'static str,
    result: &Result<T, SchedulerError>,
    started: Instant,
) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(OPERATIONS_TOTAL, "operation" => operation, "status" => status).increment(1);
    metrics::histogram!(OPERATION_DURATION_SECONDS, "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}
