use crate::{validate_key, BlobStore};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A `BlobStore` that keeps every collection as a subdirectory of `root`,
/// and every blob as a file named after its key within it.
///
/// Writes go to a `.tmp`-suffixed sibling file and are renamed into place,
/// so a reader never observes a partial write; a per-`(collection, key)`
/// lock additionally serializes concurrent writers to the same blob, the
/// same discipline `control`'s builds root uses per build id.
#[derive(Debug)]
pub struct FileSystemBlobStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<(String, String), Arc<Mutex<()>>>>>,
}

impl FileSystemBlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FileSystemBlobStore {
            root: root.as_ref().to_owned(),
            locks: Default::default(),
        }
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    fn blob_path(&self, collection: &str, key: &str) -> PathBuf {
        self.collection_dir(collection).join(key)
    }

    async fn lock_for(&self, collection: &str, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry((collection.to_string(), key.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn create_collection(&self, collection: &str) -> anyhow::Result<()> {
        validate_key(collection)?;
        tokio::fs::create_dir_all(self.collection_dir(collection)).await?;
        Ok(())
    }

    async fn write(&self, collection: &str, key: &str, bytes: Bytes) -> anyhow::Result<()> {
        validate_key(key)?;
        let lock = self.lock_for(collection, key).await;
        let _guard = lock.lock().await;

        let dest = self.blob_path(collection, key);
        let tmp = dest.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &dest).await?;
        Ok(())
    }

    async fn read(&self, collection: &str, key: &str) -> anyhow::Result<Bytes> {
        let bytes = tokio::fs::read(self.blob_path(collection, key)).await?;
        Ok(Bytes::from(bytes))
    }

    async fn size(&self, collection: &str, key: &str) -> anyhow::Result<u64> {
        let metadata = tokio::fs::metadata(self.blob_path(collection, key)).await?;
        Ok(metadata.len())
    }

    fn path(&self, collection: &str, key: &str) -> String {
        self.blob_path(collection, key).display().to_string()
    }

    async fn delete(&self, collection: &str, key: &str) -> anyhow::Result<()> {
        let path = self.blob_path(collection, key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_collection(&self, collection: &str) -> anyhow::Result<()> {
        let dir = self.collection_dir(collection);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(dir.path());
        store.create_collection("events").await.unwrap();

        store
            .write("events", "abc123", Bytes::from_static(b"payload"))
            .await
            .unwrap();

        let got = store.read("events", "abc123").await.unwrap();
        assert_eq!(&got[..], b"payload");
        assert_eq!(store.size("events", "abc123").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(dir.path());
        store.create_collection("events").await.unwrap();

        store.delete("events", "missing").await.unwrap();
        store.delete("events", "missing").await.unwrap();
    }

    #[tokio::test]
    async fn delete_collection_removes_all_blobs() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(dir.path());
        store.create_collection("events").await.unwrap();
        store
            .write("events", "one", Bytes::from_static(b"a"))
            .await
            .unwrap();

        store.delete_collection("events").await.unwrap();
        assert!(store.read("events", "one").await.is_err());
    }
}
