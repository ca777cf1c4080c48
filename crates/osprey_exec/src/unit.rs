//! The per-shard work unit: open → execute → drain → close against one
//! shard, wrapped with begin/end instrumentation.
//!
//! Every unit follows the state machine
//! `Pending → Connecting → Executing → Draining → Completed`, or drops to
//! `Failed` from any non-terminal state. A shard-scoped error is caught
//! here and reported in the outcome; it never escapes the unit boundary.
//! Timing is best-effort observability and never load-bearing.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use osprey_common::error::DriverError;
use osprey_common::types::ShardId;

use crate::aggregate::RowSink;
use crate::driver::{AsyncShardDriver, ShardDriver};
use crate::registry::ShardDescriptor;

/// Work unit states. `Completed` and `Failed` are terminal; every unit that
/// starts reaches one of them before the run returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Connecting,
    Executing,
    Draining,
    Completed,
    Failed,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Completed | UnitState::Failed)
    }
}

/// Terminal record of one unit.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub shard_id: ShardId,
    /// Always terminal.
    pub state: UnitState,
    /// Rows this unit appended to the shared sink. Zero for failed units:
    /// rows are buffered locally during the drain and flushed only on
    /// success, so a mid-drain failure contributes nothing.
    pub rows_appended: usize,
    pub elapsed: Duration,
    pub error: Option<DriverError>,
}

impl UnitOutcome {
    /// Outcome for a unit whose task died outside the driver contract
    /// (worker panic). Still terminal: a dead unit must not hang the run.
    pub(crate) fn from_panic(shard_id: ShardId, elapsed: Duration, detail: String) -> Self {
        Self {
            shard_id,
            state: UnitState::Failed,
            rows_appended: 0,
            elapsed,
            error: Some(DriverError::Execute {
                query: String::new(),
                reason: format!("unit panicked: {}", detail),
            }),
        }
    }
}

/// Run one unit to a terminal state on the calling thread.
pub fn run_unit(
    descriptor: &ShardDescriptor,
    query: &str,
    driver: &dyn ShardDriver,
    sink: &RowSink,
) -> UnitOutcome {
    let start = Instant::now();
    debug!(shard = %descriptor.id, "begin fanout unit");
    let result = drain_shard(descriptor, query, driver);
    finish_unit(descriptor.id, start, result, sink)
}

/// Async twin of [`run_unit`] with identical semantics; suspends at the
/// driver's I/O boundaries instead of blocking.
pub async fn run_unit_async(
    descriptor: &ShardDescriptor,
    query: &str,
    driver: &dyn AsyncShardDriver,
    sink: &RowSink,
) -> UnitOutcome {
    let start = Instant::now();
    debug!(shard = %descriptor.id, "begin fanout unit");
    let result = drain_shard_async(descriptor, query, driver).await;
    finish_unit(descriptor.id, start, result, sink)
}

fn drain_shard(
    descriptor: &ShardDescriptor,
    query: &str,
    driver: &dyn ShardDriver,
) -> Result<Vec<String>, DriverError> {
    trace!(shard = %descriptor.id, state = ?UnitState::Connecting);
    let mut conn = driver.open(&descriptor.target)?;

    trace!(shard = %descriptor.id, state = ?UnitState::Executing);
    let mut reader = conn.execute_read(query)?;

    trace!(shard = %descriptor.id, state = ?UnitState::Draining);
    let mut rows = Vec::new();
    while let Some(row) = reader.next_row()? {
        rows.push(row);
    }
    Ok(rows)
    // conn dropped here — and on every error path above — releasing the
    // connection regardless of how the unit exits.
}

async fn drain_shard_async(
    descriptor: &ShardDescriptor,
    query: &str,
    driver: &dyn AsyncShardDriver,
) -> Result<Vec<String>, DriverError> {
    trace!(shard = %descriptor.id, state = ?UnitState::Connecting);
    let mut conn = driver.open(&descriptor.target).await?;

    trace!(shard = %descriptor.id, state = ?UnitState::Executing);
    let mut reader = conn.execute_read(query).await?;

    trace!(shard = %descriptor.id, state = ?UnitState::Draining);
    let mut rows = Vec::new();
    while let Some(row) = reader.next_row().await? {
        rows.push(row);
    }
    Ok(rows)
}

fn finish_unit(
    shard_id: ShardId,
    start: Instant,
    result: Result<Vec<String>, DriverError>,
    sink: &RowSink,
) -> UnitOutcome {
    let outcome = match result {
        Ok(rows) => {
            let rows_appended = rows.len();
            sink.extend(rows);
            UnitOutcome {
                shard_id,
                state: UnitState::Completed,
                rows_appended,
                elapsed: start.elapsed(),
                error: None,
            }
        }
        Err(e) => {
            warn!(shard = %shard_id, error = %e, "fanout unit failed");
            UnitOutcome {
                shard_id,
                state: UnitState::Failed,
                rows_appended: 0,
                elapsed: start.elapsed(),
                error: Some(e),
            }
        }
    };
    debug!(
        shard = %shard_id,
        elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0,
        rows = outcome.rows_appended,
        "end fanout unit"
    );
    outcome
}
