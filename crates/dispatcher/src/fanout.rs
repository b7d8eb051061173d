//! Fan-Out Coordinator - one worker per batch, bounded, with a join point

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use contracts::{DispatchSummary, RecordSender, ValidatedConfig};
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};

use crate::barrier::CompletionBarrier;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::partition::Batch;
use crate::worker::{run_batch, WorkerOptions};

/// Fan-out configuration
#[derive(Debug, Clone, Copy)]
pub struct FanOutConfig {
    /// Workers allowed to run at once
    pub max_concurrency: NonZeroUsize,
    /// Append decoded fields as query parameters
    pub enrich: bool,
}

impl From<&ValidatedConfig> for FanOutConfig {
    fn from(config: &ValidatedConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            enrich: config.enrich,
        }
    }
}

/// Launches one worker per batch and waits for all of them
///
/// Workers beyond `max_concurrency` wait for a permit; every batch is still
/// processed and [`FanOut::dispatch`] returns only after the last one.
pub struct FanOut<S> {
    sender: Arc<S>,
    config: FanOutConfig,
    metrics: Arc<DispatchMetrics>,
}

impl<S> FanOut<S>
where
    S: RecordSender + Sync + 'static,
{
    /// Create a coordinator around a shared sender
    pub fn new(sender: S, config: FanOutConfig) -> Self {
        Self {
            sender: Arc::new(sender),
            config,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Live counters across every dispatch of this coordinator
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispatch every batch and block until all workers have finished
    ///
    /// Never fails: the summary tells how many records were delivered.
    #[instrument(
        name = "fan_out_dispatch",
        skip(self, batches),
        fields(batches = batches.len(), max_concurrency = self.config.max_concurrency.get())
    )]
    pub async fn dispatch(&self, batches: Vec<Batch>) -> DispatchSummary {
        let started = Instant::now();
        let mut summary = DispatchSummary {
            batches: batches.len(),
            ..Default::default()
        };

        if batches.is_empty() {
            info!("No records, nothing to dispatch");
            return summary;
        }

        let barrier = CompletionBarrier::new(batches.len());
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.get()));
        let options = WorkerOptions {
            enrich: self.config.enrich,
        };

        let mut handles = Vec::with_capacity(batches.len());
        for batch in batches {
            let guard = barrier.guard();
            let sender = Arc::clone(&self.sender);
            let permits = Arc::clone(&permits);
            let metrics = Arc::clone(&self.metrics);

            handles.push(tokio::spawn(async move {
                let _guard = guard;
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = permits.acquire_owned().await.ok();
                run_batch(&batch, sender.as_ref(), options, &metrics).await
            }));
        }

        barrier.wait().await;

        for handle in handles {
            match handle.await {
                Ok(report) => summary.absorb(&report),
                Err(e) => {
                    summary.lost_batches += 1;
                    error!(error = %e, "Batch worker panicked");
                }
            }
        }

        summary.elapsed = started.elapsed();
        observability::record_dispatch_summary(&summary);

        info!(
            batches = summary.batches,
            records = summary.records,
            delivered = summary.delivered + summary.decode_failed,
            failed = summary.failed(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Fan-out complete"
        );

        summary
    }
}
