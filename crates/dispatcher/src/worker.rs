//! Dispatch Worker - sends one batch, record by record

use std::time::Instant;

use contracts::{query_pairs, BatchReport, DispatchOutcome, Record, RecordSender};
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::DispatchMetrics;
use crate::partition::Batch;

/// Per-worker behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerOptions {
    /// Append decoded fields as query parameters
    pub enrich: bool,
}

/// Process every record of `batch` strictly in order
///
/// Never stops early: each record gets exactly one request and one outcome,
/// whatever happened to the previous ones.
#[instrument(
    name = "dispatch_worker",
    skip(batch, sender, metrics),
    fields(batch = batch.index(), records = batch.len(), endpoint = %sender.target())
)]
pub async fn run_batch<S>(
    batch: &Batch,
    sender: &S,
    options: WorkerOptions,
    metrics: &DispatchMetrics,
) -> BatchReport
where
    S: RecordSender + Sync,
{
    let started = Instant::now();
    let in_flight = metrics.worker_started();

    let mut outcomes = Vec::with_capacity(batch.len());
    for record in batch.records() {
        let outcome = dispatch_record(record, sender, options).await;
        metrics.inc_requests();
        if !outcome.is_delivered() {
            metrics.inc_failure_count();
        }
        observability::record_dispatch_outcome(outcome.label());
        outcomes.push(outcome);
    }

    in_flight.complete();

    let report = BatchReport {
        batch_index: batch.index(),
        outcomes,
        elapsed: started.elapsed(),
    };

    info!(
        batch = report.batch_index,
        records = report.outcomes.len(),
        delivered = report.delivered(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Batch dispatched"
    );

    report
}

async fn dispatch_record<S>(record: &Record, sender: &S, options: WorkerOptions) -> DispatchOutcome
where
    S: RecordSender + Sync,
{
    let query = match record.decode() {
        Ok(fields) if options.enrich => query_pairs(&fields),
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(line = record.index, error = %e, "Record is not a JSON object, sending anyway");
            return DispatchOutcome::from_attempt(false, send(record, sender, &[]).await);
        }
    };

    DispatchOutcome::from_attempt(true, send(record, sender, &query).await)
}

async fn send<S>(
    record: &Record,
    sender: &S,
    query: &[(String, String)],
) -> Result<(), contracts::DeliveryError>
where
    S: RecordSender + Sync,
{
    let result = sender.send(record, query).await;
    match &result {
        Ok(()) => debug!(line = record.index, "Record delivered"),
        Err(e) => error!(line = record.index, endpoint = %sender.target(), error = %e, "Dispatch failed"),
    }
    result
}
