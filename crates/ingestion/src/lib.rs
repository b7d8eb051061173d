//! # Ingestion
//!
//! Everything between an inbound notification and an ordered record list.
//!
//! Responsibilities:
//! - Read notification events from a stream (`NotificationFeed`)
//! - Decode the typed envelope into an `ObjectRef` (`NotificationEvent`)
//! - Retrieve the object (`LocalFsObjectStore`, `InMemoryObjectStore`)
//! - Split object bytes into line-records (`extract_records`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{extract_records, LocalFsObjectStore, NotificationFeed};
//! use contracts::ObjectStore;
//!
//! let store = LocalFsObjectStore::new("/data");
//! let feed = NotificationFeed::spawn(tokio::io::BufReader::new(tokio::io::stdin()), 16);
//! while let Some(Ok(event)) = feed.next().await {
//!     for record in &event.records {
//!         let object = record.object_ref()?;
//!         let bytes = store.get(&object.bucket, &object.key).await?;
//!         let extraction = extract_records(&bytes);
//!     }
//! }
//! ```

mod envelope;
mod error;
mod extractor;
mod feed;
mod stores;

// Re-exports
pub use contracts::{ObjectRef, Record};
pub use envelope::{unescape_key, NotificationEvent, NotificationRecord, TopicMessage};
pub use error::{IngestionError, Result};
pub use extractor::{extract_from_reader, extract_records, Extraction};
pub use feed::{FeedItem, NotificationFeed};
pub use stores::{InMemoryObjectStore, LocalFsObjectStore};
