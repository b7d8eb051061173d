//! Notification loop - coordinates all components.
//!
//! For every notification: resolve the object, fetch it, extract records,
//! partition them and fan out. Notifications are handled one after another;
//! a bad notification is skipped and the loop moves on.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Instant;

use contracts::{DispatchSummary, ObjectStore, RecordSender};
use dispatcher::{partition, FanOut, FanOutConfig};
use ingestion::{extract_records, NotificationFeed, NotificationRecord};
use observability::{record_notification, NotificationStatus};
use tokio::io::AsyncBufRead;
use tracing::{info, instrument, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Records per batch
    pub batch_size: NonZeroUsize,

    /// Fan-out settings shared by every notification
    pub fan_out: FanOutConfig,

    /// Notification feed channel capacity
    pub buffer_size: usize,
}

/// Why a notification was skipped
#[derive(Debug)]
enum Skip {
    Malformed(String),
    RetrievalFailed(String),
}

/// Main notification loop
pub struct Pipeline<O, S> {
    store: O,
    fan_out: FanOut<S>,
    config: PipelineConfig,
}

impl<O, S> Pipeline<O, S>
where
    O: ObjectStore + Sync,
    S: RecordSender + Sync + 'static,
{
    /// Create a pipeline reading objects from `store` and sending through `sender`
    pub fn new(store: O, sender: S, config: PipelineConfig) -> Self {
        Self {
            store,
            fan_out: FanOut::new(sender, config.fan_out),
            config,
        }
    }

    /// Process every event from `input` until EOF or `shutdown` resolves
    ///
    /// A notification whose dispatch has started always runs to completion;
    /// `shutdown` is only observed between events.
    pub async fn run<R, F>(&self, input: R, shutdown: F) -> PipelineStats
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let feed = NotificationFeed::spawn(input, self.config.buffer_size);
        let mut stats = PipelineStats::default();

        tokio::pin!(shutdown);

        info!(
            batch_size = self.config.batch_size.get(),
            max_concurrency = self.config.fan_out.max_concurrency.get(),
            enrich = self.config.fan_out.enrich,
            store = self.store.name(),
            "Notification loop running"
        );

        loop {
            let item = tokio::select! {
                item = feed.next() => item,
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping notification loop");
                    stats.interrupted = true;
                    break;
                }
            };

            let Some(item) = item else {
                break;
            };
            stats.events += 1;

            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Skipping notification event");
                    record_notification(NotificationStatus::Malformed);
                    stats.relay.skip();
                    continue;
                }
            };

            for notification in &event.records {
                match self.handle_notification(notification).await {
                    Ok(summary) => {
                        record_notification(NotificationStatus::Dispatched);
                        stats.relay.update(&summary);
                    }
                    Err(Skip::Malformed(reason)) => {
                        warn!(message_id = notification.message_id(), reason = %reason, "Skipping notification");
                        record_notification(NotificationStatus::Malformed);
                        stats.relay.skip();
                    }
                    Err(Skip::RetrievalFailed(reason)) => {
                        warn!(message_id = notification.message_id(), reason = %reason, "Skipping notification");
                        record_notification(NotificationStatus::RetrievalFailed);
                        stats.relay.skip();
                    }
                }
            }
        }

        feed.close().await;

        stats.dispatch = self.fan_out.metrics();
        stats.duration = start_time.elapsed();

        info!(
            events = stats.events,
            duration_secs = stats.duration.as_secs_f64(),
            "Notification loop finished"
        );

        stats
    }

    /// Relay one notification: fetch, extract, partition, fan out
    #[instrument(
        name = "notification",
        skip(self, notification),
        fields(message_id = notification.message_id())
    )]
    async fn handle_notification(
        &self,
        notification: &NotificationRecord,
    ) -> Result<DispatchSummary, Skip> {
        let object = notification
            .object_ref()
            .map_err(|e| Skip::Malformed(e.to_string()))?;

        let bytes = self
            .store
            .get(&object.bucket, &object.key)
            .await
            .map_err(|e| Skip::RetrievalFailed(e.to_string()))?;

        let extraction = extract_records(&bytes);
        if let Some(ref e) = extraction.truncated {
            warn!(object = %object, error = %e, "Object truncated, relaying the lines read so far");
        }

        info!(
            object = %object,
            bytes = bytes.len(),
            records = extraction.len(),
            "Object retrieved"
        );

        let batches = partition(extraction.records, self.config.batch_size);
        Ok(self.fan_out.dispatch(batches).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeliveryError, Record};
    use ingestion::InMemoryObjectStore;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Sender that remembers every record it was asked to send
    #[derive(Clone, Default)]
    struct CollectingSender {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl RecordSender for CollectingSender {
        fn target(&self) -> &str {
            "collecting"
        }

        async fn send(&self, record: &Record, _query: &[(String, String)]) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(record.raw.clone());
            Ok(())
        }
    }

    fn event(bucket: &str, key: &str) -> String {
        let message = serde_json::json!({
            "Records": [{"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}]
        });
        serde_json::json!({
            "Records": [{"Sns": {"MessageId": "m-1", "Message": message.to_string()}}]
        })
        .to_string()
    }

    fn config(batch_size: usize) -> PipelineConfig {
        PipelineConfig {
            batch_size: NonZeroUsize::new(batch_size).unwrap(),
            fan_out: FanOutConfig {
                max_concurrency: NonZeroUsize::new(4).unwrap(),
                enrich: false,
            },
            buffer_size: 4,
        }
    }

    fn input(events: &[String]) -> Cursor<Vec<u8>> {
        Cursor::new(events.join("\n").into_bytes())
    }

    #[tokio::test]
    async fn test_relays_every_line_of_the_object() {
        let store = InMemoryObjectStore::new();
        store.put("logs", "2024/day 1.jsonl", "{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n");
        let sender = CollectingSender::default();
        let sent = Arc::clone(&sender.sent);

        let pipeline = Pipeline::new(store, sender, config(2));
        let stats = pipeline
            .run(input(&[event("logs", "2024/day%201.jsonl")]), std::future::pending())
            .await;

        let mut sent = sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["{\"a\":1}", "{\"a\":2}", "{\"a\":3}"]);
        assert_eq!(stats.events, 1);
        assert_eq!(stats.relay.notifications, 1);
        assert_eq!(stats.relay.records, 3);
        assert_eq!(stats.dispatch.batches_completed, 2);
        assert!(!stats.interrupted);
    }

    #[tokio::test]
    async fn test_bad_notifications_are_skipped() {
        let store = InMemoryObjectStore::new();
        store.put("logs", "ok.jsonl", "{}\n");
        let sender = CollectingSender::default();
        let sent = Arc::clone(&sender.sent);

        let events = vec![
            "{\"not\":\"an event\"}".to_string(),
            event("logs", "missing.jsonl"),
            event("", "ok.jsonl"),
            event("logs", "ok.jsonl"),
        ];

        let pipeline = Pipeline::new(store, sender, config(10));
        let stats = pipeline.run(input(&events), std::future::pending()).await;

        assert_eq!(sent.lock().unwrap().len(), 1);
        assert_eq!(stats.events, 4);
        assert_eq!(stats.relay.skipped_notifications, 3);
        assert_eq!(stats.relay.notifications, 1);
    }

    #[tokio::test]
    async fn test_empty_object_dispatches_nothing() {
        let store = InMemoryObjectStore::new();
        store.put("logs", "empty.jsonl", "");

        let pipeline = Pipeline::new(store, CollectingSender::default(), config(3));
        let stats = pipeline
            .run(input(&[event("logs", "empty.jsonl")]), std::future::pending())
            .await;

        assert_eq!(stats.relay.notifications, 1);
        assert_eq!(stats.relay.records, 0);
        assert_eq!(stats.dispatch.batches_completed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_loop() {
        let pipeline = Pipeline::new(
            InMemoryObjectStore::new(),
            CollectingSender::default(),
            config(3),
        );

        // Stdin-like input that never ends
        let (_writer, reader) = tokio::io::duplex(64);
        let stats = pipeline
            .run(tokio::io::BufReader::new(reader), async {})
            .await;

        assert!(stats.interrupted);
        assert_eq!(stats.events, 0);
    }
}
