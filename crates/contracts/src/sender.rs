//! RecordSender trait - Dispatch Worker output interface
//!
//! Defines the abstract interface for delivering one record to the target.

use crate::{DeliveryError, Record};

/// Outbound delivery trait
///
/// One call is one request. Implementations hold the target (read-only)
/// and are shared by every worker of a fan-out, hence `&self`.
#[trait_variant::make(RecordSender: Send)]
pub trait LocalRecordSender {
    /// Target description (used for logging)
    fn target(&self) -> &str;

    /// Deliver one record
    ///
    /// `query` holds optional enrichment parameters; empty means none.
    ///
    /// # Errors
    /// Returns the reason the request was not accepted with status 200.
    async fn send(&self, record: &Record, query: &[(String, String)])
        -> Result<(), DeliveryError>;
}
