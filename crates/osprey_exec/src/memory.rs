//! Same-process shard simulation for the fan-out executor.
//!
//! A [`MemoryCluster`] maps connection target strings to per-shard row
//! vectors, letting every strategy, the CLI, and the tests run without a
//! real database server. Fault injection hooks simulate the production
//! failure modes at each phase of a unit: connection refusal, query
//! failure, and mid-drain row-read failure, plus configurable per-operation
//! I/O delay.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use osprey_common::error::DriverError;

use crate::driver::{
    AsyncRowReader, AsyncShardConnection, AsyncShardDriver, RowReader, ShardConnection,
    ShardDriver,
};

/// Which phase of a unit an armed fault fires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Refuse the connection open.
    Connect,
    /// Fail when the query is executed.
    Execute,
    /// Fail midway through draining rows (after half have been yielded).
    RowRead,
}

/// In-process shard store with fault injection.
///
/// Thread-safe; share via `Arc`. Targets must be seeded before a driver
/// opens them — an unseeded target behaves like an unreachable host.
#[derive(Default)]
pub struct MemoryCluster {
    tables: Mutex<HashMap<String, Vec<String>>>,
    faults: Mutex<HashMap<String, FaultKind>>,
    io_delay_us: AtomicU64,
    faults_fired: AtomicU64,
}

impl MemoryCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed the rows one shard's query will produce.
    pub fn seed(&self, target: &str, rows: Vec<String>) {
        self.tables.lock().insert(target.to_string(), rows);
    }

    /// Arm a fault for one target. At most one fault per target; the fault
    /// stays armed until cleared, firing on every unit that touches the
    /// target.
    pub fn arm_fault(&self, target: &str, kind: FaultKind) {
        self.faults.lock().insert(target.to_string(), kind);
    }

    pub fn clear_fault(&self, target: &str) {
        self.faults.lock().remove(target);
    }

    /// Simulated I/O latency applied to connection opens and row fetches.
    pub fn set_io_delay(&self, delay: Duration) {
        self.io_delay_us
            .store(delay.as_micros() as u64, Ordering::Relaxed);
    }

    /// Count of injected faults that have fired, for test observability.
    pub fn faults_fired(&self) -> u64 {
        self.faults_fired.load(Ordering::Relaxed)
    }

    /// A driver handle backed by this cluster. Implements both the blocking
    /// and async sides of the driver contract.
    pub fn driver(self: &Arc<Self>) -> Arc<MemoryDriver> {
        Arc::new(MemoryDriver {
            cluster: self.clone(),
        })
    }

    fn io_delay(&self) -> Duration {
        Duration::from_micros(self.io_delay_us.load(Ordering::Relaxed))
    }

    fn fault_for(&self, target: &str) -> Option<FaultKind> {
        self.faults.lock().get(target).copied()
    }

    fn fire_fault(&self) {
        self.faults_fired.fetch_add(1, Ordering::Relaxed);
    }

    /// Resolve a target to its seeded rows, applying any armed connect
    /// fault. Unknown targets are unreachable hosts.
    fn connect(&self, target: &str) -> Result<ShardTable, DriverError> {
        if self.fault_for(target) == Some(FaultKind::Connect) {
            self.fire_fault();
            return Err(DriverError::Connect {
                target: target.to_string(),
                reason: "injected connection refusal".into(),
            });
        }
        let rows = self.tables.lock().get(target).cloned().ok_or_else(|| {
            DriverError::Connect {
                target: target.to_string(),
                reason: "unknown target".into(),
            }
        })?;
        Ok(ShardTable {
            target: target.to_string(),
            rows,
            fault: self.fault_for(target),
        })
    }
}

/// Snapshot of one shard's state taken at connection open.
struct ShardTable {
    target: String,
    rows: Vec<String>,
    fault: Option<FaultKind>,
}

impl ShardTable {
    fn execute(&self, cluster: &MemoryCluster, query: &str) -> Result<MemoryRows, DriverError> {
        if self.fault == Some(FaultKind::Execute) {
            cluster.fire_fault();
            return Err(DriverError::Execute {
                query: query.to_string(),
                reason: format!("injected execution failure on {}", self.target),
            });
        }
        // A RowRead fault lets half the rows through before erroring, so a
        // failed drain is observably mid-stream.
        let fail_after = match self.fault {
            Some(FaultKind::RowRead) => Some(self.rows.len() / 2),
            _ => None,
        };
        Ok(MemoryRows {
            rows: self.rows.clone().into_iter(),
            yielded: 0,
            fail_after,
        })
    }
}

/// Driver handle backed by a [`MemoryCluster`].
pub struct MemoryDriver {
    cluster: Arc<MemoryCluster>,
}

impl ShardDriver for MemoryDriver {
    fn open(&self, target: &str) -> Result<Box<dyn ShardConnection>, DriverError> {
        std::thread::sleep(self.cluster.io_delay());
        let table = self.cluster.connect(target)?;
        Ok(Box::new(MemoryConnection {
            cluster: self.cluster.clone(),
            table,
        }))
    }
}

#[async_trait]
impl AsyncShardDriver for MemoryDriver {
    async fn open(&self, target: &str) -> Result<Box<dyn AsyncShardConnection>, DriverError> {
        tokio::time::sleep(self.cluster.io_delay()).await;
        let table = self.cluster.connect(target)?;
        Ok(Box::new(MemoryConnection {
            cluster: self.cluster.clone(),
            table,
        }))
    }
}

struct MemoryConnection {
    cluster: Arc<MemoryCluster>,
    table: ShardTable,
}

impl ShardConnection for MemoryConnection {
    fn execute_read(&mut self, query: &str) -> Result<Box<dyn RowReader>, DriverError> {
        let rows = self.table.execute(&self.cluster, query)?;
        Ok(Box::new(rows))
    }
}

#[async_trait]
impl AsyncShardConnection for MemoryConnection {
    async fn execute_read(
        &mut self,
        query: &str,
    ) -> Result<Box<dyn AsyncRowReader>, DriverError> {
        let rows = self.table.execute(&self.cluster, query)?;
        Ok(Box::new(AsyncMemoryRows {
            inner: rows,
            delay: self.cluster.io_delay(),
        }))
    }
}

struct MemoryRows {
    rows: std::vec::IntoIter<String>,
    yielded: usize,
    fail_after: Option<usize>,
}

impl MemoryRows {
    fn advance(&mut self) -> Result<Option<String>, DriverError> {
        if self.fail_after == Some(self.yielded) {
            return Err(DriverError::RowRead {
                reason: "injected row stream failure".into(),
            });
        }
        match self.rows.next() {
            Some(row) => {
                self.yielded += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }
}

impl RowReader for MemoryRows {
    fn next_row(&mut self) -> Result<Option<String>, DriverError> {
        self.advance()
    }
}

struct AsyncMemoryRows {
    inner: MemoryRows,
    delay: Duration,
}

#[async_trait]
impl AsyncRowReader for AsyncMemoryRows {
    async fn next_row(&mut self) -> Result<Option<String>, DriverError> {
        // Suspension point: the cooperative scheduler interleaves other
        // units here while this one waits on simulated row-fetch I/O.
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(driver: &MemoryDriver, target: &str) -> Result<Vec<String>, DriverError> {
        let mut conn = ShardDriver::open(driver, target)?;
        let mut reader = conn.execute_read("select value from test_sharding")?;
        let mut rows = Vec::new();
        while let Some(row) = reader.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    #[test]
    fn test_seeded_rows_round_trip() {
        let cluster = MemoryCluster::new();
        cluster.seed("mem://0", vec!["a".into(), "b".into()]);
        let rows = drain(&cluster.driver(), "mem://0").expect("drain");
        assert_eq!(rows, vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_target_is_connect_error() {
        let cluster = MemoryCluster::new();
        let err = drain(&cluster.driver(), "mem://missing").unwrap_err();
        assert!(matches!(err, DriverError::Connect { .. }));
    }

    #[test]
    fn test_connect_fault_fires() {
        let cluster = MemoryCluster::new();
        cluster.seed("mem://0", vec!["a".into()]);
        cluster.arm_fault("mem://0", FaultKind::Connect);
        let err = drain(&cluster.driver(), "mem://0").unwrap_err();
        assert!(matches!(err, DriverError::Connect { .. }));
        assert_eq!(cluster.faults_fired(), 1);
    }

    #[test]
    fn test_execute_fault_fires() {
        let cluster = MemoryCluster::new();
        cluster.seed("mem://0", vec!["a".into()]);
        cluster.arm_fault("mem://0", FaultKind::Execute);
        let err = drain(&cluster.driver(), "mem://0").unwrap_err();
        assert!(matches!(err, DriverError::Execute { .. }));
    }

    #[test]
    fn test_row_read_fault_fires_mid_drain() {
        let cluster = MemoryCluster::new();
        cluster.seed(
            "mem://0",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
        );
        cluster.arm_fault("mem://0", FaultKind::RowRead);
        let err = drain(&cluster.driver(), "mem://0").unwrap_err();
        assert!(matches!(err, DriverError::RowRead { .. }));
    }

    #[test]
    fn test_clear_fault_restores_shard() {
        let cluster = MemoryCluster::new();
        cluster.seed("mem://0", vec!["a".into()]);
        cluster.arm_fault("mem://0", FaultKind::Connect);
        cluster.clear_fault("mem://0");
        let rows = drain(&cluster.driver(), "mem://0").expect("healthy again");
        assert_eq!(rows, vec!["a"]);
    }

    #[tokio::test]
    async fn test_async_side_matches_sync_side() {
        let cluster = MemoryCluster::new();
        cluster.seed("mem://0", vec!["x".into(), "y".into()]);
        let driver = cluster.driver();

        let mut conn = AsyncShardDriver::open(&*driver, "mem://0").await.expect("open");
        let mut reader = conn
            .execute_read("select value from test_sharding")
            .await
            .expect("execute");
        let mut rows = Vec::new();
        while let Some(row) = reader.next_row().await.expect("read") {
            rows.push(row);
        }
        assert_eq!(rows, vec!["x", "y"]);
    }
}
