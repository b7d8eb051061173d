//! CompletionBarrier - join point for one fan-out

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug)]
struct BarrierState {
    expected: usize,
    finished: AtomicUsize,
    notify: Notify,
}

/// Counts finished workers out of a known total
///
/// Each worker holds one [`CompletionGuard`]; dropping it signals
/// completion, so a worker signals exactly once even when it panics.
#[derive(Debug, Clone)]
pub struct CompletionBarrier {
    state: Arc<BarrierState>,
}

impl CompletionBarrier {
    /// Create a barrier expecting `expected` workers
    pub fn new(expected: usize) -> Self {
        Self {
            state: Arc::new(BarrierState {
                expected,
                finished: AtomicUsize::new(0),
                notify: Notify::new(),
            }),
        }
    }

    /// Hand out the completion signal for one worker
    pub fn guard(&self) -> CompletionGuard {
        CompletionGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Workers that have not signalled yet
    pub fn pending(&self) -> usize {
        self.state
            .expected
            .saturating_sub(self.state.finished.load(Ordering::Acquire))
    }

    /// Whether every expected worker has signalled
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    /// Wait until every expected worker has signalled
    ///
    /// Returns immediately for a barrier expecting zero workers.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a signal in between is not lost
            notified.as_mut().enable();

            if self.is_complete() {
                return;
            }
            notified.await;
        }
    }
}

/// Completion signal held by one worker
#[derive(Debug)]
pub struct CompletionGuard {
    state: Arc<BarrierState>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let finished = self.state.finished.fetch_add(1, Ordering::AcqRel) + 1;
        if finished >= self.state.expected {
            self.state.notify.notify_waiters();
        }
    }
}
