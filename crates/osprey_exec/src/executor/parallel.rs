//! Parallel strategy: fan the per-shard units out across a bounded pool of
//! scoped worker threads.
//!
//! Workers pull the next unvisited shard off a shared atomic cursor, so the
//! pool stays busy regardless of how unevenly shards respond. Each unit
//! owns its connection exclusively; the only cross-unit shared state is the
//! append-only row sink. A failed — or even panicking — unit never cancels
//! its siblings; the scope join guarantees every unit is terminal before
//! this returns.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use osprey_common::types::ShardId;

use crate::aggregate::RowSink;
use crate::driver::ShardDriver;
use crate::registry::ShardRegistry;
use crate::unit::{run_unit, UnitOutcome};

pub(super) fn run(
    registry: &ShardRegistry,
    query: &str,
    driver: &dyn ShardDriver,
    sink: &RowSink,
    max_workers: usize,
) -> (Vec<UnitOutcome>, Vec<ShardId>) {
    let descriptors = registry.descriptors();
    let workers = max_workers.max(1).min(descriptors.len());
    let cursor = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<UnitOutcome>> = Mutex::new(Vec::with_capacity(descriptors.len()));

    std::thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(descriptor) = descriptors.get(i) else {
                    break;
                };
                let start = Instant::now();
                let outcome =
                    catch_unwind(AssertUnwindSafe(|| run_unit(descriptor, query, driver, sink)))
                        .unwrap_or_else(|payload| {
                            UnitOutcome::from_panic(
                                descriptor.id,
                                start.elapsed(),
                                panic_detail(payload),
                            )
                        });
                outcomes.lock().push(outcome);
            });
        }
    });

    // Barrier semantics: the scope has joined every worker, so all units
    // are terminal. No shard is ever skipped under this strategy.
    (outcomes.into_inner(), Vec::new())
}

fn panic_detail(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
