//! LocalFsObjectStore - buckets as directories under a root

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use contracts::{ContractError, ObjectStore};
use tracing::{debug, instrument};

/// Store that maps `bucket/key` to `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct LocalFsObjectStore {
    root: PathBuf,
}

impl LocalFsObjectStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path, refusing anything that escapes the bucket
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ContractError> {
        let bucket_path = Path::new(bucket);
        let key_path = Path::new(key);
        let confined = |p: &Path| p.components().all(|c| matches!(c, Component::Normal(_)));

        if !confined(bucket_path) || !confined(key_path) {
            return Err(ContractError::object_retrieval(
                bucket,
                key,
                "path escapes the store root",
            ));
        }

        Ok(self.root.join(bucket_path).join(key_path))
    }
}

impl ObjectStore for LocalFsObjectStore {
    fn name(&self) -> &str {
        "local_fs"
    }

    #[instrument(
        name = "local_fs_store_get",
        skip(self),
        fields(root = %self.root.display())
    )]
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ContractError> {
        let path = self.object_path(bucket, key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "Object read");
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ContractError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(ContractError::object_retrieval(bucket, key, e.to_string())),
        }
    }
}
