use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// osq — run the same read query against every shard of a simulated
/// topology under all three execution strategies and compare timing.
#[derive(Debug, Parser)]
#[command(name = "osq", about = "Osprey shard fan-out query runner", version)]
pub struct Args {
    /// Configuration file (TOML). Flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of shards to fan out over (overrides config).
    #[arg(long)]
    pub shards: Option<i64>,

    /// Query to execute on every shard (overrides config).
    #[arg(long)]
    pub query: Option<String>,

    /// Rows seeded into each simulated shard.
    #[arg(long, default_value_t = 5)]
    pub rows_per_shard: u64,

    /// Simulated per-operation I/O latency in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Worker pool size for the parallel strategy (0 = hardware parallelism).
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    /// Arm a fault on one shard to demonstrate partial-failure reporting.
    #[arg(long)]
    pub fail_shard: Option<u64>,

    /// Which unit phase the armed fault fires in.
    #[arg(long, value_enum, default_value = "connect")]
    pub fail_kind: FailKind,

    /// Print per-shard row counts and timing.
    #[arg(long)]
    pub per_shard: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub export: Export,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9400).
    #[arg(long)]
    pub metrics_addr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailKind {
    Connect,
    Execute,
    RowRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Export {
    Text,
    Json,
}
