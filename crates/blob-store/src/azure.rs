use crate::{validate_key, BlobStore};
use azure_storage::prelude::*;
use azure_storage_blobs::prelude::*;
use bytes::Bytes;
use futures::stream::StreamExt;

/// A `BlobStore` backed by a single Azure Blob Storage container. Collections
/// are modeled as a blob-name prefix (`{collection}/{key}`) rather than real
/// containers, since collection names are created at runtime and container
/// creation is a heavier, ACL-bearing operation.
///
/// Azure blob names may not contain consecutive `/`-delimited runs of `_`
/// cleanly in every client library's URL-encoding path, so collection and key
/// are sanitized by replacing `_` with `-` before building the blob name --
/// unlike `FileSystemBlobStore`, which uses the key verbatim as a filename.
#[derive(Debug)]
pub struct AzureBlobStore {
    container: ContainerClient,
}

impl AzureBlobStore {
    pub fn new(connection_string: &str, container_name: &str) -> anyhow::Result<Self> {
        let client = BlobServiceClient::new(
            account_name_from_connection_string(connection_string)?,
            StorageCredentials::connection_string(connection_string)?,
        );
        Ok(AzureBlobStore {
            container: client.container_client(sanitize(container_name)),
        })
    }

    fn blob_name(&self, collection: &str, key: &str) -> String {
        format!("{}/{}", sanitize(collection), sanitize(key))
    }
}

fn sanitize(segment: &str) -> String {
    segment.replace('_', "-")
}

fn account_name_from_connection_string(connection_string: &str) -> anyhow::Result<String> {
    connection_string
        .split(';')
        .find_map(|part| part.strip_prefix("AccountName="))
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("AZURE_STORAGE_CONNECTION_STRING missing AccountName"))
}

#[async_trait::async_trait]
impl BlobStore for AzureBlobStore {
    async fn create_collection(&self, collection: &str) -> anyhow::Result<()> {
        validate_key(collection)?;
        // No real container to create: the collection prefix comes into
        // existence with its first blob.
        if !self.container.exists().await? {
            self.container.create().await?;
        }
        Ok(())
    }

    async fn write(&self, collection: &str, key: &str, bytes: Bytes) -> anyhow::Result<()> {
        validate_key(key)?;
        let blob = self.container.blob_client(self.blob_name(collection, key));
        blob.put_block_blob(bytes).await?;
        Ok(())
    }

    async fn read(&self, collection: &str, key: &str) -> anyhow::Result<Bytes> {
        let blob = self.container.blob_client(self.blob_name(collection, key));
        let data = blob.get_content().await?;
        Ok(Bytes::from(data))
    }

    async fn size(&self, collection: &str, key: &str) -> anyhow::Result<u64> {
        let blob = self.container.blob_client(self.blob_name(collection, key));
        let props = blob.get_properties().await?;
        Ok(props.blob.properties.content_length)
    }

    fn path(&self, collection: &str, key: &str) -> String {
        format!(
            "azblob://{}/{}",
            self.container.container_name(),
            self.blob_name(collection, key)
        )
    }

    async fn delete(&self, collection: &str, key: &str) -> anyhow::Result<()> {
        let blob = self.container.blob_client(self.blob_name(collection, key));
        match blob.delete().await {
            Ok(_) => Ok(()),
            Err(e) if e.as_http_error().map(|e| e.status().as_u16()) == Some(404) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_collection(&self, collection: &str) -> anyhow::Result<()> {
        let prefix = format!("{}/", sanitize(collection));
        let mut stream = self.container.list_blobs().prefix(prefix).into_stream();
        while let Some(page) = stream.next().await {
            let page = page?;
            for blob in page.blobs.blobs() {
                self.container.blob_client(&blob.name).delete().await?;
            }
        }
        Ok(())
    }
}
