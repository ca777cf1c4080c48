//! End-to-end fan-out scenarios exercised across all three strategies.
//!
//! The cross-strategy correctness invariant: for the same shard data, the
//! aggregated row multiset is strategy-independent; only scheduling and
//! wall-clock behavior differ.

use std::sync::Arc;

use osprey_common::error::DriverError;
use osprey_common::types::ShardId;
use osprey_exec::{
    ExecutorOptions, FanoutReport, FaultKind, MemoryCluster, ShardQueryExecutor, ShardRegistry,
    Strategy, TargetProvider,
};

const QUERY: &str = "select value from test_sharding";

struct MemProvider;

impl TargetProvider for MemProvider {
    fn connection_target(&self, shard: ShardId) -> String {
        format!("mem://{}", shard.0)
    }
}

fn seed_shards(cluster: &Arc<MemoryCluster>, per_shard: &[Vec<&str>]) -> ShardRegistry {
    for (i, rows) in per_shard.iter().enumerate() {
        cluster.seed(
            &format!("mem://{}", i),
            rows.iter().map(|r| r.to_string()).collect(),
        );
    }
    ShardRegistry::build(per_shard.len() as i64, &MemProvider).expect("registry")
}

fn executor(cluster: &Arc<MemoryCluster>) -> ShardQueryExecutor {
    ShardQueryExecutor::new(cluster.driver())
        .with_options(ExecutorOptions { max_workers: 4 })
}

fn sorted_rows(report: &FanoutReport) -> Vec<String> {
    let mut rows = report.rows.clone();
    rows.sort();
    rows
}

#[test]
fn three_shard_scenario_all_strategies() {
    // Registry of 3 shards returning ["a"], ["b","c"], [] — aggregated set
    // must be exactly {a, b, c} with no failures, for every strategy.
    let cluster = MemoryCluster::new();
    let registry = seed_shards(&cluster, &[vec!["a"], vec!["b", "c"], vec![]]);
    let executor = executor(&cluster);

    for strategy in Strategy::ALL {
        let report = executor.run(&registry, QUERY, strategy).expect("run");
        assert_eq!(sorted_rows(&report), vec!["a", "b", "c"], "{}", strategy);
        assert!(report.failures.is_empty(), "{}", strategy);
        assert!(report.skipped.is_empty(), "{}", strategy);
        assert!(!report.is_partial(), "{}", strategy);
        // The empty shard succeeded with zero rows — visible as such.
        assert_eq!(report.per_shard_rows, vec![
            (ShardId(0), 1),
            (ShardId(1), 2),
            (ShardId(2), 0),
        ]);
    }
}

#[test]
fn strategies_agree_on_row_multiset() {
    let cluster = MemoryCluster::new();
    let data: Vec<Vec<&str>> = vec![
        vec!["a", "b"],
        vec![],
        vec!["c"],
        vec!["d", "e", "f"],
        vec!["g"],
    ];
    let registry = seed_shards(&cluster, &data);
    let executor = executor(&cluster);

    let baseline = executor
        .run(&registry, QUERY, Strategy::Sequential)
        .expect("sequential");
    for strategy in [Strategy::Parallel, Strategy::Cooperative] {
        let report = executor.run(&registry, QUERY, strategy).expect("run");
        assert_eq!(
            sorted_rows(&report),
            sorted_rows(&baseline),
            "row multiset must be strategy-independent ({})",
            strategy
        );
        assert_eq!(report.row_count(), 7);
    }
}

#[test]
fn empty_registry_yields_empty_result_for_every_strategy() {
    let cluster = MemoryCluster::new();
    let registry = ShardRegistry::build(0, &MemProvider).expect("registry");
    let executor = executor(&cluster);

    for strategy in Strategy::ALL {
        let report = executor.run(&registry, QUERY, strategy).expect("run");
        assert_eq!(report.row_count(), 0, "{}", strategy);
        assert!(report.failures.is_empty(), "{}", strategy);
        assert_eq!(report.timing.total, std::time::Duration::ZERO);
    }
}

#[test]
fn one_failing_shard_isolated_under_parallel_and_cooperative() {
    // Shard 0 refuses connections; shard 1 returns ["x"]. The concurrent
    // strategies still return {x} plus exactly one recorded failure.
    let cluster = MemoryCluster::new();
    let registry = seed_shards(&cluster, &[vec!["dead"], vec!["x"]]);
    cluster.arm_fault("mem://0", FaultKind::Connect);
    let executor = executor(&cluster);

    for strategy in [Strategy::Parallel, Strategy::Cooperative] {
        let report = executor.run(&registry, QUERY, strategy).expect("run");
        assert_eq!(report.rows, vec!["x"], "{}", strategy);
        assert_eq!(report.failures.len(), 1, "{}", strategy);
        assert_eq!(report.failures[0].shard_id, ShardId(0));
        assert!(
            matches!(report.failures[0].cause, DriverError::Connect { .. }),
            "{}",
            strategy
        );
        assert!(report.skipped.is_empty(), "{}", strategy);
        assert!(report.is_partial(), "{}", strategy);
    }
}

#[test]
fn sequential_fail_fast_reports_failure_and_skipped() {
    let cluster = MemoryCluster::new();
    let registry = seed_shards(&cluster, &[vec!["dead"], vec!["x"]]);
    cluster.arm_fault("mem://0", FaultKind::Connect);
    let executor = executor(&cluster);

    let report = executor
        .run(&registry, QUERY, Strategy::Sequential)
        .expect("run");

    assert!(report.rows.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].shard_id, ShardId(0));
    assert_eq!(report.skipped, vec![ShardId(1)]);
    assert!(report.is_partial());
}

#[test]
fn failures_isolated_with_many_healthy_shards() {
    let cluster = MemoryCluster::new();
    let data: Vec<Vec<&str>> = (0..9).map(|i| vec![if i % 2 == 0 { "even" } else { "odd" }]).collect();
    let registry = seed_shards(&cluster, &data);
    cluster.arm_fault("mem://4", FaultKind::RowRead);
    let executor = executor(&cluster);

    for strategy in [Strategy::Parallel, Strategy::Cooperative] {
        let report = executor.run(&registry, QUERY, strategy).expect("run");
        assert_eq!(report.row_count(), 8, "{}", strategy);
        assert_eq!(report.failures.len(), 1, "{}", strategy);
        assert_eq!(report.failures[0].shard_id, ShardId(4));
        assert!(
            matches!(report.failures[0].cause, DriverError::RowRead { .. }),
            "{}",
            strategy
        );
    }
}

#[test]
fn per_shard_timing_covers_every_attempted_shard() {
    let cluster = MemoryCluster::new();
    let registry = seed_shards(&cluster, &[vec!["a"], vec!["b"], vec!["c"]]);
    let executor = executor(&cluster);

    for strategy in Strategy::ALL {
        let report = executor.run(&registry, QUERY, strategy).expect("run");
        assert_eq!(report.timing.per_shard.len(), 3, "{}", strategy);
        let ids: Vec<u64> = report.timing.per_shard.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2], "sorted by shard id ({})", strategy);
        assert!(report.timing.total >= std::time::Duration::ZERO);
    }
}

#[test]
fn query_failure_distinguished_from_empty_shard() {
    let cluster = MemoryCluster::new();
    let registry = seed_shards(&cluster, &[vec![], vec!["y"]]);
    cluster.arm_fault("mem://1", FaultKind::Execute);
    let executor = executor(&cluster);

    let report = executor
        .run(&registry, QUERY, Strategy::Parallel)
        .expect("run");

    // Shard 0: zero rows, succeeded. Shard 1: failed. The report keeps the
    // two cases apart — a caller can report partial results honestly.
    assert_eq!(report.per_shard_rows, vec![(ShardId(0), 0)]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].shard_id, ShardId(1));
    assert!(report.rows.is_empty());
}

#[test]
fn bounded_pool_still_visits_every_shard() {
    let cluster = MemoryCluster::new();
    let data: Vec<Vec<&str>> = (0..32).map(|_| vec!["r"]).collect();
    let registry = seed_shards(&cluster, &data);
    let executor = ShardQueryExecutor::new(cluster.driver())
        .with_options(ExecutorOptions { max_workers: 2 });

    let report = executor
        .run(&registry, QUERY, Strategy::Parallel)
        .expect("run");

    assert_eq!(report.row_count(), 32);
    assert_eq!(report.per_shard_rows.len(), 32);
    assert!(report.failures.is_empty());
}
