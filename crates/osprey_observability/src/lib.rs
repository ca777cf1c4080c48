//! Observability setup: structured logging and metrics (Prometheus).

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with structured logging to
/// stderr, so CLI report output on stdout stays clean.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,osprey=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Initialize the Prometheus metrics exporter on the given listen address.
pub fn init_metrics(listen_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = listen_addr.parse()?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("Prometheus metrics endpoint on http://{}/metrics", addr);
    Ok(())
}

/// Record one completed fan-out run.
pub fn record_fanout_run(strategy: &str, duration_us: u64, rows: usize, failures: usize) {
    metrics::counter!(
        "osprey_fanout_runs_total",
        "strategy" => strategy.to_string(),
        "partial" => (failures > 0).to_string()
    )
    .increment(1);
    metrics::histogram!(
        "osprey_fanout_duration_us",
        "strategy" => strategy.to_string()
    )
    .record(duration_us as f64);
    metrics::counter!(
        "osprey_fanout_rows_total",
        "strategy" => strategy.to_string()
    )
    .increment(rows as u64);
}

/// Record one per-shard unit completion.
pub fn record_shard_unit(shard_id: u64, duration_us: u64, success: bool) {
    metrics::counter!(
        "osprey_shard_units_total",
        "success" => success.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "osprey_shard_unit_duration_us",
        "shard" => shard_id.to_string()
    )
    .record(duration_us as f64);
}
