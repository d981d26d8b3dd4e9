//! Progress reporting for long-running scans

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

/// Receives a completion percentage (0-100) from a running scan.
///
/// Implementations must be `Send + Sync` so scans can run on other threads.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Sink for callers that do not care about progress
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: u8) {}
}

/// Keeps the latest percentage so it can be polled from elsewhere
#[derive(Default)]
pub struct PolledProgress {
    latest: AtomicU8,
}

impl PolledProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u8 {
        self.latest.load(Ordering::Acquire)
    }
}

impl ProgressSink for PolledProgress {
    fn report(&self, percent: u8) {
        self.latest.store(percent, Ordering::Release);
    }
}

/// Records every reported percentage, mostly for tests and debugging
#[derive(Default)]
pub struct RecordedProgress {
    values: Mutex<Vec<u8>>,
}

impl RecordedProgress {
    pub fn values(&self) -> Vec<u8> {
        self.values.lock().clone()
    }
}

impl ProgressSink for RecordedProgress {
    fn report(&self, percent: u8) {
        self.values.lock().push(percent);
    }
}

/// Integer percentage of `done` out of `total`, clamped to 100
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
