//! ObjectStore trait - object retrieval collaborator

use bytes::Bytes;

use crate::ContractError;

/// Object retrieval trait
///
/// `(bucket, key) -> bytes`. Implementations must be shareable across the
/// notification loop.
#[trait_variant::make(ObjectStore: Send)]
pub trait LocalObjectStore {
    /// Store name (used for logging)
    fn name(&self) -> &str;

    /// Fetch the whole object
    ///
    /// # Errors
    /// `ObjectNotFound` when absent, `ObjectRetrieval` / `Io` otherwise.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ContractError>;
}
