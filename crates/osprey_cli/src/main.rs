//! osq — seed a simulated shard topology, fan the configured query out
//! under all three strategies in sequence, and print per-strategy timing,
//! row counts, and failures.

mod args;
mod report;

use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use args::{Args, Export, FailKind};
use osprey_common::config::FanoutConfig;
use osprey_common::types::ShardId;
use osprey_exec::{
    ExecutorOptions, FaultKind, MemoryCluster, ShardQueryExecutor, ShardRegistry, Strategy,
};
use report::StrategySummary;

fn main() {
    if let Err(e) = run() {
        eprintln!("osq: error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    osprey_observability::init_tracing();
    let args = Args::parse();

    if let Some(addr) = args.metrics_addr.as_deref() {
        osprey_observability::init_metrics(addr)
            .map_err(|e| anyhow::anyhow!("metrics exporter: {}", e))?;
    }

    let config = load_config(&args)?;
    let shard_count = args
        .shards
        .unwrap_or(config.topology.shard_count as i64);
    let query = args
        .query
        .clone()
        .unwrap_or_else(|| config.executor.query.clone());

    // In-process topology standing in for the external database
    // collaborator; every seeded target answers the fixed query with
    // synthetic rows.
    let cluster = MemoryCluster::new();
    cluster.set_io_delay(Duration::from_millis(args.latency_ms));
    for shard in 0..shard_count.max(0) as u64 {
        let target = config.topology.connection_target(ShardId(shard));
        let rows = (0..args.rows_per_shard)
            .map(|i| format!("shard{}_value{}", shard, i))
            .collect();
        cluster.seed(&target, rows);
    }
    if let Some(shard) = args.fail_shard {
        let target = config.topology.connection_target(ShardId(shard));
        cluster.arm_fault(&target, fault_kind(args.fail_kind));
    }

    let registry = ShardRegistry::build(shard_count, &config.topology)
        .context("building shard registry")?;
    let max_workers = if args.workers > 0 {
        args.workers
    } else {
        config.executor.max_workers
    };
    let executor =
        ShardQueryExecutor::new(cluster.driver()).with_options(ExecutorOptions { max_workers });

    let mut summaries = Vec::new();
    let mut succeeded = 0usize;
    for strategy in Strategy::ALL {
        match executor.run(&registry, &query, strategy) {
            Ok(report) => {
                osprey_observability::record_fanout_run(
                    strategy.as_str(),
                    report.timing.total.as_micros() as u64,
                    report.row_count(),
                    report.failures.len(),
                );
                for (shard, elapsed) in &report.timing.per_shard {
                    let failed = report.failures.iter().any(|f| f.shard_id == *shard);
                    osprey_observability::record_shard_unit(
                        shard.0,
                        elapsed.as_micros() as u64,
                        !failed,
                    );
                }
                summaries.push(StrategySummary::from_report(&report));
                succeeded += 1;
            }
            // A strategy-level error is reported, not propagated; the
            // remaining strategies still run.
            Err(e) => {
                error!(strategy = %strategy, error = %e, "strategy run failed");
                eprintln!("osq: {} strategy failed: {}", strategy, e);
            }
        }
    }

    match args.export {
        Export::Text => {
            for summary in &summaries {
                summary.print_text(args.per_shard);
            }
        }
        Export::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }

    anyhow::ensure!(succeeded > 0, "every strategy failed");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<FanoutConfig> {
    let config = match args.config.as_deref() {
        Some(path) => FanoutConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FanoutConfig::default(),
    };
    config
        .validate()
        .map_err(|reason| anyhow::anyhow!("invalid configuration: {}", reason))?;
    Ok(config)
}

fn fault_kind(kind: FailKind) -> FaultKind {
    match kind {
        FailKind::Connect => FaultKind::Connect,
        FailKind::Execute => FaultKind::Execute,
        FailKind::RowRead => FaultKind::RowRead,
    }
}
