//! Time source for acceptance timestamps and dedup windows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of "now" in Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock that never goes backwards.
///
/// If the system time is stepped back (NTP, manual change) the last
/// returned value is repeated until the wall clock catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_ms: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let wall = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let prev = self.last_ms.fetch_max(wall, Ordering::SeqCst);
        prev.max(wall)
    }
}

/// Manually advanced clock for tests and session replays.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the buffer.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
