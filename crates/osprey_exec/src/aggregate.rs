//! Concurrency-safe, append-only result aggregation.

use std::sync::Arc;

use parking_lot::Mutex;

/// The aggregated result set shared by all units of one run.
///
/// Append-only and multi-producer: units push rows concurrently; no row is
/// lost or duplicated. Insertion order is not significant and must not be
/// relied on by any consumer. Created fresh per executor run and consumed
/// read-only at completion.
#[derive(Clone, Default)]
pub struct RowSink {
    inner: Arc<Mutex<Vec<String>>>,
}

impl RowSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row.
    pub fn push(&self, row: String) {
        self.inner.lock().push(row);
    }

    /// Append a batch of rows as one locked section.
    ///
    /// Units buffer their drained rows locally and flush here once the
    /// drain completes, so a unit that fails mid-drain contributes no rows.
    pub fn extend(&self, rows: Vec<String>) {
        self.inner.lock().extend(rows);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Consume the sink and hand the rows to the caller.
    ///
    /// Falls back to copying out when another handle is still alive (the
    /// executor only calls this after every unit has reached a terminal
    /// state, so the fast path is the normal one).
    pub fn into_rows(self) -> Vec<String> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}
