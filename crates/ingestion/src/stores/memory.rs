//! InMemoryObjectStore - objects held in a map

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use contracts::{ContractError, ObjectStore};

/// Store backed by an in-process map, keyed by `(bucket, key)`
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Bytes>>,
}

impl InMemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object
    pub fn put(&self, bucket: impl Into<String>, key: impl Into<String>, data: impl Into<Bytes>) {
        let mut objects = self
            .objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects.insert((bucket.into(), key.into()), data.into());
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ContractError> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ContractError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryObjectStore::new();
        store.put("b", "k", "line\n");
        assert_eq!(store.len(), 1);
        assert_eq!(&store.get("b", "k").await.unwrap()[..], b"line\n");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryObjectStore::new();
        assert!(store.is_empty());
        assert!(matches!(
            store.get("b", "k").await,
            Err(ContractError::ObjectNotFound { .. })
        ));
    }
}
