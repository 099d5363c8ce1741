mod azure;
mod local;

pub use azure::AzureBlobStore;
pub use local::FileSystemBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use models::Invariant;
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Rejects collection and blob-store keys that would escape the store's
/// namespace or collide with its own path separators (spec.md §4.1).
pub fn validate_key(key: &str) -> Result<(), Invariant> {
    if KEY_PATTERN.is_match(key) {
        Ok(())
    } else {
        Err(Invariant::InvalidBlobKey(key.to_string()))
    }
}

/// Durable object storage for fragment and buffer payloads (spec.md §4.1).
/// A collection is a namespace within the store; a key identifies one blob
/// (a buffered fragment's or merged fragment's `uuid`) within it.
///
/// Implementations never interpret blob contents -- that's the parser's and
/// columnar bridge's job. `write` is atomic: readers never observe a
/// partially-written blob.
#[async_trait]
pub trait BlobStore: std::fmt::Debug + Send + Sync {
    /// Creates the namespace for `collection`. Idempotent: calling this for
    /// a collection that already has blobs is not an error.
    async fn create_collection(&self, collection: &str) -> anyhow::Result<()>;

    /// Writes `bytes` under `key` within `collection`. On success the blob is
    /// immediately and fully readable; on failure no partial blob is left
    /// behind.
    async fn write(&self, collection: &str, key: &str, bytes: Bytes) -> anyhow::Result<()>;

    async fn read(&self, collection: &str, key: &str) -> anyhow::Result<Bytes>;

    /// Size in bytes of the blob stored under `key`, as actually persisted
    /// (i.e. post-compression where the bridge compresses).
    async fn size(&self, collection: &str, key: &str) -> anyhow::Result<u64>;

    /// A location string the columnar bridge can hand to its Parquet/Arrow
    /// readers directly -- a filesystem path for `FileSystemBlobStore`, a
    /// fully qualified container URL for `AzureBlobStore`.
    fn path(&self, collection: &str, key: &str) -> String;

    async fn delete(&self, collection: &str, key: &str) -> anyhow::Result<()>;

    /// Removes every blob belonging to `collection`. Used by
    /// `Engine::delete_collection`; the catalog row is deleted separately.
    async fn delete_collection(&self, collection: &str) -> anyhow::Result<()>;
}
