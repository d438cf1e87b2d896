//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Result of storing an object.
#[derive(Clone, Debug)]
pub struct StoredObject {
    /// Key the object was stored under.
    pub key: String,
    /// Public location of the object.
    pub url: String,
}

/// A streaming download of a stored object.
pub struct ObjectDownload {
    pub stream: ByteStream,
    pub content_type: String,
    /// Object size in bytes, when the backend reports one.
    pub length: Option<u64>,
}

/// Object store abstraction for image binaries.
///
/// The metadata layer never looks inside objects; it only needs this
/// put/exists/stream/delete contract.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Store an object, overwriting any existing object under the key.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<StoredObject>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Open an object as a byte stream.
    async fn get_stream(&self, key: &str) -> StorageResult<ObjectDownload>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the name of this storage backend, for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// Called during server startup so configuration errors surface before
    /// requests are accepted. The default is a no-op, suitable for backends
    /// with nothing to probe.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
