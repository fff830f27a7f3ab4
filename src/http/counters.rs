use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Byte totals shared by every request issued through one client.
///
/// Cloning hands out another reference to the same cells. Updates are
/// relaxed atomic adds.
#[derive(Debug, Clone, Default)]
pub struct ByteCounters {
    cells: Arc<CounterCells>,
}

#[derive(Debug, Default)]
struct CounterCells {
    read: AtomicU64,
    written: AtomicU64,
}

impl ByteCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes received so far.
    #[must_use]
    pub fn read(&self) -> u64 {
        self.cells.read.load(Ordering::Relaxed)
    }

    /// Total bytes sent so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.cells.written.load(Ordering::Relaxed)
    }

    pub(crate) fn add_read(&self, bytes: usize) {
        self.cells.read.fetch_add(to_u64(bytes), Ordering::Relaxed);
    }

    pub(crate) fn add_written(&self, bytes: usize) {
        self.cells
            .written
            .fetch_add(to_u64(bytes), Ordering::Relaxed);
    }

    pub(crate) fn add_read_u64(&self, bytes: u64) {
        self.cells.read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn add_written_u64(&self, bytes: u64) {
        self.cells.written.fetch_add(bytes, Ordering::Relaxed);
    }
}

fn to_u64(bytes: usize) -> u64 {
    u64::try_from(bytes).unwrap_or(u64::MAX)
}
