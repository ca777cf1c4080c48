//! The database collaborator boundary.
//!
//! The executor depends only on a three-operation contract: open a
//! connection against an opaque target string, execute a read-only query,
//! and drain single-column string rows until exhausted. Closing is implicit
//! in `Drop`, so a connection is released on every exit path, including
//! query failure. Any conforming driver is tolerated; this crate ships only
//! the in-process [`crate::memory::MemoryDriver`].
//!
//! Two mirrors of the same contract exist: a blocking one used by the
//! sequential and parallel strategies, and an async one used by the
//! cooperative strategy, which suspends at the connection-open and
//! row-fetch boundaries instead of blocking its control thread.

use async_trait::async_trait;

use osprey_common::error::DriverError;

/// Blocking driver: opens connections against opaque target strings.
pub trait ShardDriver: Send + Sync {
    fn open(&self, target: &str) -> Result<Box<dyn ShardConnection>, DriverError>;
}

/// One open connection. Owned exclusively by a single per-shard unit;
/// never shared across units. Dropping the connection releases it.
pub trait ShardConnection: Send {
    fn execute_read(&mut self, query: &str) -> Result<Box<dyn RowReader>, DriverError>;
}

/// Streaming row cursor: `next_row` yields rows until `Ok(None)`.
pub trait RowReader: Send {
    fn next_row(&mut self) -> Result<Option<String>, DriverError>;
}

/// Async driver mirror for the cooperative strategy.
#[async_trait]
pub trait AsyncShardDriver: Send + Sync {
    async fn open(&self, target: &str) -> Result<Box<dyn AsyncShardConnection>, DriverError>;
}

#[async_trait]
pub trait AsyncShardConnection: Send {
    async fn execute_read(
        &mut self,
        query: &str,
    ) -> Result<Box<dyn AsyncRowReader>, DriverError>;
}

#[async_trait]
pub trait AsyncRowReader: Send {
    async fn next_row(&mut self) -> Result<Option<String>, DriverError>;
}
