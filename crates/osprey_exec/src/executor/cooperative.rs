//! Cooperative strategy: every per-shard unit runs as an independently
//! scheduled task on one control thread.
//!
//! The executor owns a current-thread tokio runtime; while one unit is
//! suspended waiting on connection-open or row-fetch I/O, the thread
//! executes other ready units. This yields parallel-like throughput
//! without dedicated worker threads. Every spawned task is awaited before
//! returning — the run never reports completion while units are still in
//! flight — and a failed or panicked task never aborts its siblings.

use std::sync::Arc;
use std::time::Instant;

use osprey_common::error::FanoutError;
use osprey_common::types::ShardId;

use crate::aggregate::RowSink;
use crate::driver::AsyncShardDriver;
use crate::registry::ShardRegistry;
use crate::unit::{run_unit_async, UnitOutcome};

pub(super) fn run(
    registry: &ShardRegistry,
    query: &str,
    driver: Arc<dyn AsyncShardDriver>,
    sink: &RowSink,
) -> Result<(Vec<UnitOutcome>, Vec<ShardId>), FanoutError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| FanoutError::Internal(format!("cooperative runtime build: {}", e)))?;

    let outcomes = runtime.block_on(async {
        let start = Instant::now();
        let handles: Vec<(ShardId, tokio::task::JoinHandle<UnitOutcome>)> = registry
            .descriptors()
            .iter()
            .map(|descriptor| {
                let descriptor = descriptor.clone();
                let shard_id = descriptor.id;
                let query = query.to_string();
                let driver = driver.clone();
                let sink = sink.clone();
                let handle = tokio::spawn(async move {
                    run_unit_async(&descriptor, &query, &*driver, &sink).await
                });
                (shard_id, handle)
            })
            .collect();

        // Await every task; a panicked task is converted into a failed
        // terminal outcome for its shard rather than poisoning the run.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (shard_id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => outcomes.push(UnitOutcome::from_panic(
                    shard_id,
                    start.elapsed(),
                    e.to_string(),
                )),
            }
        }
        outcomes
    });

    Ok((outcomes, Vec::new()))
}
