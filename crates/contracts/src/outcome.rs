//! DispatchOutcome - per-record result of a dispatch attempt

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DeliveryError;

/// Per-record result
///
/// Observational only: outcomes are logged and counted, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DispatchOutcome {
    /// Request sent and answered with 200
    Delivered,
    /// Request sent and answered with 200, but the line was not a JSON object
    DecodeFailed,
    /// Timeout, connection or other transport error
    TransportFailed { reason: String },
    /// Target answered with a status other than 200
    StatusFailed { status: u16 },
}

impl DispatchOutcome {
    /// Combine the decode result and the delivery result for one record
    ///
    /// A delivery failure takes precedence over a decode failure.
    pub fn from_attempt(decoded: bool, delivery: Result<(), DeliveryError>) -> Self {
        match delivery {
            Ok(()) if decoded => Self::Delivered,
            Ok(()) => Self::DecodeFailed,
            Err(DeliveryError::Status(status)) => Self::StatusFailed { status },
            Err(other) => Self::TransportFailed {
                reason: other.to_string(),
            },
        }
    }

    /// Whether the request reached the target and was accepted
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered | Self::DecodeFailed)
    }

    /// Stable label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::DecodeFailed => "decode_failed",
            Self::TransportFailed { .. } => "transport_failed",
            Self::StatusFailed { .. } => "status_failed",
        }
    }
}

/// Outcomes of one batch, in record order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Batch position within its notification
    pub batch_index: usize,

    /// One outcome per record of the batch
    pub outcomes: Vec<DispatchOutcome>,

    /// Time the worker spent on the batch (excluding pool wait)
    pub elapsed: Duration,
}

impl BatchReport {
    /// Number of records accepted by the target
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }
}

/// Aggregate result of one fan-out
///
/// Returned by the coordinator once every worker has finished. It never
/// signals an error; partial failure is visible through the counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Batches launched
    pub batches: usize,
    /// Records attempted
    pub records: usize,
    /// Records answered with 200 and decoded
    pub delivered: usize,
    /// Records answered with 200 but not decodable
    pub decode_failed: usize,
    /// Records lost to timeout / connection / transport errors
    pub transport_failed: usize,
    /// Records answered with a non-200 status
    pub status_failed: usize,
    /// Workers that panicked before reporting
    pub lost_batches: usize,
    /// Wall-clock time from launch to join
    pub elapsed: Duration,
}

impl DispatchSummary {
    /// Fold one batch report into the summary
    pub fn absorb(&mut self, report: &BatchReport) {
        self.records += report.outcomes.len();
        for outcome in &report.outcomes {
            match outcome {
                DispatchOutcome::Delivered => self.delivered += 1,
                DispatchOutcome::DecodeFailed => self.decode_failed += 1,
                DispatchOutcome::TransportFailed { .. } => self.transport_failed += 1,
                DispatchOutcome::StatusFailed { .. } => self.status_failed += 1,
            }
        }
    }

    /// Records the target did not accept
    pub fn failed(&self) -> usize {
        self.transport_failed + self.status_failed
    }

    /// Whether every record reached the target and no worker was lost
    pub fn all_delivered(&self) -> bool {
        self.failed() == 0 && self.lost_batches == 0
    }
}
