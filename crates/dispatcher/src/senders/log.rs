//! LogSender - logs records instead of sending them (dry runs)

use contracts::{DeliveryError, Record, RecordSender};
use tracing::{info, instrument};

/// Sender that only logs what would have been sent
pub struct LogSender {
    target: String,
}

impl LogSender {
    /// Create a LogSender standing in for `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl RecordSender for LogSender {
    fn target(&self) -> &str {
        &self.target
    }

    #[instrument(
        name = "log_sender_send",
        skip(self, record, query),
        fields(line = record.index)
    )]
    async fn send(&self, record: &Record, query: &[(String, String)]) -> Result<(), DeliveryError> {
        info!(
            endpoint = %self.target,
            bytes = record.raw.len(),
            query_params = query.len(),
            "Dry run, record not sent"
        );
        Ok(())
    }
}
