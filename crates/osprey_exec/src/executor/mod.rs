//! The fan-out executor: runs one query against every shard in a registry
//! under a chosen strategy and aggregates rows, timing, and failures.

mod cooperative;
mod parallel;
mod sequential;

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use osprey_common::error::{DriverError, FanoutError};
use osprey_common::types::ShardId;

use crate::aggregate::RowSink;
use crate::driver::{AsyncShardDriver, ShardDriver};
use crate::registry::ShardRegistry;
use crate::unit::UnitOutcome;

/// How the per-shard work units are scheduled. All three strategies produce
/// the same aggregated row multiset for the same shard data; only
/// wall-clock behavior differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One shard at a time, registry order, fail-fast.
    Sequential,
    /// Bounded worker-thread pool, isolated partial failure.
    Parallel,
    /// Single control thread, tasks suspend at I/O boundaries, isolated
    /// partial failure.
    Cooperative,
}

impl Strategy {
    pub const ALL: [Strategy; 3] =
        [Strategy::Sequential, Strategy::Parallel, Strategy::Cooperative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Cooperative => "cooperative",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Strategy::Sequential),
            "parallel" | "par" => Ok(Strategy::Parallel),
            "cooperative" | "coop" | "async" => Ok(Strategy::Cooperative),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// Executor tuning.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Worker pool size for the parallel strategy. 0 = available hardware
    /// parallelism.
    pub max_workers: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self { max_workers: 0 }
    }
}

impl ExecutorOptions {
    fn effective_workers(&self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

/// Per-shard and total elapsed time for one run. Finalized at run end;
/// read-only after. Per-shard entries are sorted by shard id.
#[derive(Debug, Clone, Default)]
pub struct TimingSample {
    pub per_shard: Vec<(ShardId, Duration)>,
    pub total: Duration,
}

/// One shard's recorded failure: which shard, and what the driver reported.
#[derive(Debug, Clone)]
pub struct ShardFailure {
    pub shard_id: ShardId,
    pub cause: DriverError,
}

/// The result of one fan-out run.
///
/// Distinguishes "zero rows, shard succeeded" (the shard appears in
/// `per_shard_rows` with count 0) from "shard failed" (the shard appears in
/// `failures`) from "shard never attempted" (`skipped`, sequential
/// fail-fast only).
#[derive(Debug, Clone)]
pub struct FanoutReport {
    pub strategy: Strategy,
    /// Aggregated rows from every successful shard. Order across shards is
    /// not guaranteed.
    pub rows: Vec<String>,
    /// Row count per successful shard, sorted by shard id.
    pub per_shard_rows: Vec<(ShardId, usize)>,
    pub failures: Vec<ShardFailure>,
    /// Shards never attempted because an earlier unit failed under the
    /// sequential strategy. Always empty for parallel/cooperative.
    pub skipped: Vec<ShardId>,
    pub timing: TimingSample,
}

impl FanoutReport {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when at least one shard failed or was never attempted.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() || !self.skipped.is_empty()
    }

    fn empty(strategy: Strategy) -> Self {
        Self {
            strategy,
            rows: Vec::new(),
            per_shard_rows: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            timing: TimingSample::default(),
        }
    }
}

/// Runs one read-only query against every shard of a registry.
///
/// The executor holds both sides of the driver contract: the blocking
/// driver serves the sequential and parallel strategies, the async driver
/// serves the cooperative one. [`crate::memory::MemoryDriver`] implements
/// both.
pub struct ShardQueryExecutor {
    driver: Arc<dyn ShardDriver>,
    async_driver: Arc<dyn AsyncShardDriver>,
    options: ExecutorOptions,
}

impl ShardQueryExecutor {
    pub fn new<D>(driver: Arc<D>) -> Self
    where
        D: ShardDriver + AsyncShardDriver + 'static,
    {
        Self {
            driver: driver.clone(),
            async_driver: driver,
            options: ExecutorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Execute `query` against every shard in `registry` under `strategy`.
    ///
    /// Every descriptor is visited exactly once (sequential fail-fast
    /// excepted, in which case unvisited shards are reported in `skipped`);
    /// every started unit reaches a terminal state before this returns.
    /// Shard-scoped errors are recorded in the report, never propagated;
    /// the `Err` path is reserved for run-scoped failures that abort before
    /// any unit starts.
    pub fn run(
        &self,
        registry: &ShardRegistry,
        query: &str,
        strategy: Strategy,
    ) -> Result<FanoutReport, FanoutError> {
        if registry.is_empty() {
            // Legal empty topology: empty result set, zero timing.
            return Ok(FanoutReport::empty(strategy));
        }

        let total_start = Instant::now();
        let sink = RowSink::new();

        let (outcomes, skipped) = match strategy {
            Strategy::Sequential => sequential::run(registry, query, &*self.driver, &sink),
            Strategy::Parallel => parallel::run(
                registry,
                query,
                &*self.driver,
                &sink,
                self.options.effective_workers(),
            ),
            Strategy::Cooperative => {
                cooperative::run(registry, query, self.async_driver.clone(), &sink)?
            }
        };

        debug_assert!(
            outcomes.iter().all(|o| o.state.is_terminal()),
            "every started unit must be terminal before the run returns"
        );

        let report = assemble_report(strategy, sink, outcomes, skipped, total_start.elapsed());
        info!(
            strategy = %strategy,
            rows = report.row_count(),
            failures = report.failures.len(),
            skipped = report.skipped.len(),
            elapsed_ms = report.timing.total.as_secs_f64() * 1000.0,
            "fanout run complete"
        );
        Ok(report)
    }
}

fn assemble_report(
    strategy: Strategy,
    sink: RowSink,
    outcomes: Vec<UnitOutcome>,
    skipped: Vec<ShardId>,
    total: Duration,
) -> FanoutReport {
    let mut per_shard = Vec::with_capacity(outcomes.len());
    let mut per_shard_rows = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        per_shard.push((outcome.shard_id, outcome.elapsed));
        match outcome.error {
            Some(cause) => failures.push(ShardFailure {
                shard_id: outcome.shard_id,
                cause,
            }),
            None => per_shard_rows.push((outcome.shard_id, outcome.rows_appended)),
        }
    }
    per_shard.sort_by_key(|(id, _)| *id);
    per_shard_rows.sort_by_key(|(id, _)| *id);
    failures.sort_by_key(|f| f.shard_id);

    FanoutReport {
        strategy,
        rows: sink.into_rows(),
        per_shard_rows,
        failures,
        skipped,
        timing: TimingSample { per_shard, total },
    }
}
