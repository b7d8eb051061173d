//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters shared by every worker of a coordinator
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Workers currently running a batch
    in_flight: AtomicUsize,
    /// Highest `in_flight` observed
    peak_in_flight: AtomicUsize,
    /// Requests issued
    requests: AtomicU64,
    /// Records that did not reach the target
    failure_count: AtomicU64,
    /// Batches finished
    batches_completed: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a worker as started
    ///
    /// The worker stays in flight until the returned guard is dropped, so a
    /// panicking worker is released too. Only [`InFlightGuard::complete`]
    /// counts the batch as completed.
    pub fn worker_started(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        InFlightGuard {
            metrics: self,
            completed: false,
        }
    }

    /// Increment request count
    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
            requests: self.requests.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
        }
    }
}

/// In-flight marker held by one running worker
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    metrics: &'a DispatchMetrics,
    completed: bool,
}

impl InFlightGuard<'_> {
    /// Leave flight with the batch fully processed
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::AcqRel);
        if self.completed {
            self.metrics
                .batches_completed
                .fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub in_flight: usize,
    pub peak_in_flight: usize,
    pub requests: u64,
    pub failure_count: u64,
    pub batches_completed: u64,
}
