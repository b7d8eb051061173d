//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::RelayMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Notification events read from the input
    pub events: u64,

    /// Whether the loop stopped on a shutdown signal instead of EOF
    pub interrupted: bool,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-notification outcome aggregator
    pub relay: RelayMetricsAggregator,

    /// Fan-out counters at the end of the run
    pub dispatch: MetricsSnapshot,
}

impl PipelineStats {
    /// Records relayed per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.relay.records as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Events read: {}", self.events);
        if self.interrupted {
            println!("Stopped by shutdown signal");
        }
        println!("Throughput: {:.2} records/s", self.records_per_sec());
        println!(
            "Requests: {} ({} failed), peak workers in flight: {}",
            self.dispatch.requests, self.dispatch.failure_count, self.dispatch.peak_in_flight
        );
        println!();
        print!("{}", self.relay.summary());
        println!();
    }
}
