//! Sequential strategy: one shard at a time, in registry order, on the
//! calling thread.
//!
//! This is the deterministic-order, lowest-throughput baseline used as a
//! timing reference. It is fail-fast by policy: the first shard-scoped
//! failure stops the walk, and every shard not yet attempted is reported as
//! skipped rather than silently dropped.

use osprey_common::types::ShardId;

use crate::aggregate::RowSink;
use crate::driver::ShardDriver;
use crate::registry::ShardRegistry;
use crate::unit::{run_unit, UnitOutcome, UnitState};

pub(super) fn run(
    registry: &ShardRegistry,
    query: &str,
    driver: &dyn ShardDriver,
    sink: &RowSink,
) -> (Vec<UnitOutcome>, Vec<ShardId>) {
    let descriptors = registry.descriptors();
    let mut outcomes = Vec::with_capacity(descriptors.len());
    let mut skipped = Vec::new();

    for (i, descriptor) in descriptors.iter().enumerate() {
        let outcome = run_unit(descriptor, query, driver, sink);
        let failed = outcome.state == UnitState::Failed;
        outcomes.push(outcome);
        if failed {
            skipped = descriptors[i + 1..].iter().map(|d| d.id).collect();
            break;
        }
    }

    (outcomes, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FaultKind, MemoryCluster};
    use crate::registry::TargetProvider;

    struct MemProvider;

    impl TargetProvider for MemProvider {
        fn connection_target(&self, shard: ShardId) -> String {
            format!("mem://{}", shard.0)
        }
    }

    const QUERY: &str = "select value from test_sharding";

    #[test]
    fn test_visits_in_registry_order() {
        let cluster = MemoryCluster::new();
        for i in 0..4 {
            cluster.seed(&format!("mem://{}", i), vec![format!("r{}", i)]);
        }
        let registry = ShardRegistry::build(4, &MemProvider).unwrap();
        let sink = RowSink::new();

        let (outcomes, skipped) = run(&registry, QUERY, &*cluster.driver(), &sink);

        let visited: Vec<u64> = outcomes.iter().map(|o| o.shard_id.0).collect();
        assert_eq!(visited, vec![0, 1, 2, 3]);
        assert!(skipped.is_empty());
        // Single-threaded appends preserve registry order.
        assert_eq!(sink.into_rows(), vec!["r0", "r1", "r2", "r3"]);
    }

    #[test]
    fn test_fail_fast_reports_unattempted_shards() {
        let cluster = MemoryCluster::new();
        for i in 0..4 {
            cluster.seed(&format!("mem://{}", i), vec![format!("r{}", i)]);
        }
        cluster.arm_fault("mem://1", FaultKind::Connect);
        let registry = ShardRegistry::build(4, &MemProvider).unwrap();
        let sink = RowSink::new();

        let (outcomes, skipped) = run(&registry, QUERY, &*cluster.driver(), &sink);

        assert_eq!(outcomes.len(), 2, "stops after the failing unit");
        assert_eq!(outcomes[1].state, UnitState::Failed);
        assert_eq!(skipped, vec![ShardId(2), ShardId(3)]);
        assert_eq!(sink.into_rows(), vec!["r0"]);
    }
}
