//! Notification envelope decoding
//!
//! An inbound event is a topic delivery carrying one or more records; each
//! record's `Message` is itself a JSON object-store event naming the bucket
//! and the URL-escaped key of a new object. Only the first nested record of
//! a message is used.
//!
//! ```text
//! {"Records":[{"Sns":{"MessageId":"..","Message":"{\"Records\":[{\"s3\":{..}}]}"}}]}
//! ```

use contracts::ObjectRef;
use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::error::{IngestionError, Result};

/// Inbound event (one delivery, possibly several notifications)
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "Records")]
    pub records: Vec<NotificationRecord>,
}

impl NotificationEvent {
    /// Decode an event from its JSON text
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| IngestionError::MalformedEvent {
            message: e.to_string(),
        })
    }

    /// Decode an event from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| IngestionError::MalformedEvent {
            message: e.to_string(),
        })
    }
}

/// One notification inside an event
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "Sns")]
    pub sns: TopicMessage,
}

/// Topic delivery payload
#[derive(Debug, Clone, Deserialize)]
pub struct TopicMessage {
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,

    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct StoreEvent {
    #[serde(rename = "Records", default)]
    records: Vec<StoreEventRecord>,
}

#[derive(Debug, Deserialize)]
struct StoreEventRecord {
    s3: StoreEntity,
}

#[derive(Debug, Deserialize)]
struct StoreEntity {
    bucket: StoreBucket,
    object: StoreObject,
}

#[derive(Debug, Deserialize)]
struct StoreBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StoreObject {
    key: String,
}

impl NotificationRecord {
    /// Message ID for logging, `-` when absent
    pub fn message_id(&self) -> &str {
        self.sns.message_id.as_deref().unwrap_or("-")
    }

    /// Resolve the object this notification announces
    ///
    /// # Errors
    /// Any shape mismatch in the nested message, an empty bucket/key, or a
    /// key that does not decode to UTF-8.
    pub fn object_ref(&self) -> Result<ObjectRef> {
        let event: StoreEvent = serde_json::from_str(&self.sns.message).map_err(|e| {
            IngestionError::MalformedMessage {
                message_id: self.message_id().to_string(),
                message: e.to_string(),
            }
        })?;

        let first = event
            .records
            .into_iter()
            .next()
            .ok_or_else(|| IngestionError::MissingObject {
                message_id: self.message_id().to_string(),
            })?;

        let key = unescape_key(&first.s3.object.key).map_err(|message| {
            IngestionError::MalformedMessage {
                message_id: self.message_id().to_string(),
                message,
            }
        })?;

        if first.s3.bucket.name.is_empty() || key.is_empty() {
            return Err(IngestionError::MissingObject {
                message_id: self.message_id().to_string(),
            });
        }

        Ok(ObjectRef::new(first.s3.bucket.name, key))
    }
}

/// Percent-decode an object key
///
/// Path semantics: `+` stays a literal plus.
pub fn unescape_key(raw: &str) -> std::result::Result<String, String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|e| format!("object key is not valid UTF-8 after unescaping: {e}"))
}
