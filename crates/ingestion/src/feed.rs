//! Notification feed
//!
//! Reads notification events from a byte stream (file or stdin) and hands
//! them to the notification loop over a bounded channel. Events may be one
//! per line or pretty-printed across several lines; lines are accumulated
//! until they form a complete JSON document. A bad line (not UTF-8, not
//! JSON, or an event left open) is reported on its own and reading goes on.

use async_channel::{bounded, Receiver, Sender};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::envelope::NotificationEvent;
use crate::error::{IngestionError, Result};

/// Item delivered by the feed: a decoded event or the reason one was dropped
pub type FeedItem = Result<NotificationEvent>;

/// Background reader producing [`FeedItem`]s
pub struct NotificationFeed {
    rx: Receiver<FeedItem>,
    reader_handle: JoinHandle<()>,
}

impl NotificationFeed {
    /// Spawn a reader task over `reader`
    ///
    /// # Arguments
    /// * `capacity` - Channel capacity; the reader waits when it is full
    pub fn spawn<R>(reader: R, capacity: usize) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = bounded(capacity.max(1));
        let reader_handle = tokio::spawn(async move {
            read_events(reader, tx).await;
        });

        Self { rx, reader_handle }
    }

    /// Receive the next item; `None` once the input is exhausted
    pub async fn next(&self) -> Option<FeedItem> {
        self.rx.recv().await.ok()
    }

    /// Stop reading and wait for the reader task to exit
    pub async fn close(self) {
        self.rx.close();
        self.reader_handle.abort();
        let _ = self.reader_handle.await;
    }
}

/// Upper bound on a multi-line event still being accumulated
pub const MAX_PENDING_EVENT_BYTES: usize = 1024 * 1024;

#[instrument(name = "notification_feed_reader", skip_all)]
async fn read_events<R>(mut reader: R, tx: Sender<FeedItem>)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut pending = String::new();
    let mut line_no: usize = 0;
    let mut emitted: u64 = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                let _ = tx.send(Err(IngestionError::Feed(e))).await;
                return;
            }
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim_end_matches(['\n', '\r']),
            Err(e) => {
                // The line is lost, and so is any document it belonged to
                warn!(line = line_no, "Skipping notification line that is not UTF-8");
                pending.clear();
                emitted += 1;
                if !emit(&tx, malformed(format!("line {line_no} is not valid UTF-8: {e}"))).await {
                    return;
                }
                continue;
            }
        };

        if pending.is_empty() && line.trim().is_empty() {
            continue;
        }

        // A complete event on its own line closes whatever was left open
        if !pending.is_empty() {
            if let Some(value) = standalone_event(line) {
                warn!(bytes = pending.len(), line = line_no, "Dropping incomplete event");
                pending.clear();
                emitted += 2;
                if !emit(&tx, malformed("event was not closed before the next one")).await
                    || !emit(&tx, NotificationEvent::from_value(value)).await
                {
                    return;
                }
                continue;
            }
        }

        pending.push_str(line);
        pending.push('\n');

        let item = match serde_json::from_str::<serde_json::Value>(&pending) {
            Ok(value) => NotificationEvent::from_value(value),
            Err(e) if e.is_eof() => {
                if pending.len() <= MAX_PENDING_EVENT_BYTES {
                    // Document continues on the next line
                    continue;
                }
                warn!(bytes = pending.len(), "Incomplete event exceeds size limit");
                malformed(format!(
                    "event exceeds {MAX_PENDING_EVENT_BYTES} bytes without closing"
                ))
            }
            Err(e) => malformed(e.to_string()),
        };
        pending.clear();
        emitted += 1;

        if !emit(&tx, item).await {
            return;
        }
    }

    if !pending.trim().is_empty() {
        warn!(bytes = pending.len(), "Input ended inside an incomplete event");
        let _ = emit(&tx, malformed("input ended inside an incomplete event")).await;
    }

    debug!(events = emitted, "Notification feed exhausted");
}

/// Send one item; false once the receiver is gone
async fn emit(tx: &Sender<FeedItem>, item: FeedItem) -> bool {
    if tx.send(item).await.is_err() {
        debug!("Feed receiver dropped, stopping reader");
        return false;
    }
    true
}

fn malformed(message: impl Into<String>) -> FeedItem {
    Err(IngestionError::MalformedEvent {
        message: message.into(),
    })
}

/// A line that is by itself a whole event envelope
///
/// Inner lines of a pretty-printed event can be complete objects too, but
/// only a top-level envelope carries `Records`.
fn standalone_event(line: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("Records").is_some().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{"Records":[{"Sns":{"Message":"{}"}}]}"#;

    async fn collect(input: &'static str) -> Vec<FeedItem> {
        let feed = NotificationFeed::spawn(input.as_bytes(), 4);
        let mut items = Vec::new();
        while let Some(item) = feed.next().await {
            items.push(item);
        }
        feed.close().await;
        items
    }

    #[tokio::test]
    async fn test_one_event_per_line() {
        let input = Box::leak(format!("{EVENT}\n\n{EVENT}\n").into_boxed_str());
        let items = collect(input).await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.is_ok()));
    }

    #[tokio::test]
    async fn test_pretty_printed_event() {
        let input = "{\n  \"Records\": [\n    {\"Sns\": {\"Message\": \"{}\"}}\n  ]\n}\n";
        let items = collect(input).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().records.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_line_does_not_stop_feed() {
        let input = Box::leak(format!("not json\n{EVENT}\n").into_boxed_str());
        let items = collect(input).await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(IngestionError::MalformedEvent { .. })));
        assert!(items[1].is_ok());
    }

    #[tokio::test]
    async fn test_truncated_trailing_event() {
        let items = collect("{\"Records\": [\n").await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    async fn collect_bytes(input: Vec<u8>) -> Vec<FeedItem> {
        let feed = NotificationFeed::spawn(std::io::Cursor::new(input), 4);
        let mut items = Vec::new();
        while let Some(item) = feed.next().await {
            items.push(item);
        }
        feed.close().await;
        items
    }

    #[tokio::test]
    async fn test_non_utf8_line_is_skipped() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(format!("{EVENT}\n{EVENT}\n").as_bytes());

        let items = collect_bytes(input).await;
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Err(IngestionError::MalformedEvent { .. })));
        assert!(items[1].is_ok());
        assert!(items[2].is_ok());
    }

    #[tokio::test]
    async fn test_unclosed_event_does_not_swallow_the_next_ones() {
        let input = format!("{{\"Records\":[\n{EVENT}\n{EVENT}\n{EVENT}\n");

        let items = collect_bytes(input.into_bytes()).await;
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], Err(IngestionError::MalformedEvent { .. })));
        assert_eq!(items.iter().filter(|i| i.is_ok()).count(), 3);
    }

    #[tokio::test]
    async fn test_pending_event_is_capped() {
        let mut input = String::from("{\"Records\": [\n");
        let filler = format!("\"{}\",\n", "x".repeat(16 * 1024));
        while input.len() <= MAX_PENDING_EVENT_BYTES {
            input.push_str(&filler);
        }
        input.push_str(EVENT);
        input.push('\n');

        let items = collect_bytes(input.into_bytes()).await;
        assert_eq!(items.len(), 2);
        let err = items[0].as_ref().unwrap_err().to_string();
        assert!(err.contains("exceeds"), "got: {err}");
        assert!(items[1].is_ok());
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        let input = format!("{EVENT}\r\n{EVENT}\r\n");
        let items = collect_bytes(input.into_bytes()).await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.is_ok()));
    }
}
