//! Shard fan-out query execution: registry construction, the database
//! driver boundary, three execution strategies (sequential, parallel,
//! cooperative), concurrency-safe row aggregation, and per-shard timing.
//!
//! The same read-only query is issued against every shard in a registry;
//! rows from all shards are merged into one aggregated result set. The
//! three strategies are interchangeable in outcome — every shard is visited
//! exactly once and the final row multiset is strategy-independent — and
//! differ only in scheduling:
//!
//! - **Sequential**: registry order on one thread, fail-fast.
//! - **Parallel**: bounded scoped-thread pool, isolated partial failure.
//! - **Cooperative**: single control thread, tasks suspend at I/O
//!   boundaries, isolated partial failure.

pub mod aggregate;
pub mod driver;
pub mod executor;
pub mod memory;
pub mod registry;
pub mod unit;

pub use aggregate::RowSink;
pub use driver::{
    AsyncRowReader, AsyncShardConnection, AsyncShardDriver, RowReader, ShardConnection,
    ShardDriver,
};
pub use executor::{
    ExecutorOptions, FanoutReport, ShardFailure, ShardQueryExecutor, Strategy, TimingSample,
};
pub use memory::{FaultKind, MemoryCluster, MemoryDriver};
pub use registry::{ShardDescriptor, ShardRegistry, TargetProvider};
pub use unit::{UnitOutcome, UnitState};
