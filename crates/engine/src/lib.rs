mod collections;
mod dedup;
mod error;
mod query;

pub use collections::CollectionSummary;
pub use error::EngineError;
pub use query::{QueryOptions, QueryRow};

use blob_store::BlobStore;
use catalog::Catalog;
use columnar::{ColumnarBridge, RowMeta};
use dedup::DedupCache;
use models::{Collection, ContentType, DomainError};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Seven days in seconds, the maximum span `advanced_query` will federate
/// over in one call (spec.md §4.5, §9).
const MAX_ADVANCED_QUERY_RANGE_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Orchestrates the blob store, catalog, and columnar bridge into the
/// operations spec.md §4.5 describes. This is the only crate that knows
/// about all three of them at once.
pub struct Engine {
    blob_store: Arc<dyn BlobStore>,
    catalog: Arc<Catalog>,
    bridge: ColumnarBridge,
    dedup: DedupCache,
    buffer_size_bytes: i64,
}

impl Engine {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        catalog: Arc<Catalog>,
        bridge: ColumnarBridge,
        buffer_size_bytes: i64,
    ) -> Self {
        Engine {
            blob_store,
            catalog,
            bridge,
            dedup: DedupCache::new(),
            buffer_size_bytes,
        }
    }

    pub async fn ensure_collection(&self, name: &str) -> Result<Collection, EngineError> {
        if let Some(existing) = self.catalog.get_collection_by_name(name).await? {
            return Ok(existing);
        }
        self.blob_store.create_collection(name).await?;
        Ok(self.catalog.create_collection(name).await?)
    }

    /// Explicit `POST /collection/` creation (spec.md §4.4): a duplicate name
    /// is a fatal `DomainError::CollectionExists` unless `allow_existing`,
    /// unlike `ensure_collection`'s implicit, always-idempotent creation from
    /// `store(..., create_collection=true)`.
    pub async fn create_collection(
        &self,
        name: &str,
        allow_existing: bool,
    ) -> Result<Collection, EngineError> {
        match self.catalog.create_collection(name).await {
            Ok(collection) => {
                self.blob_store.create_collection(name).await?;
                Ok(collection)
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                if allow_existing {
                    self.require_collection(name).await
                } else {
                    Err(DomainError::CollectionExists(name.to_string()).into())
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, EngineError> {
        let stats = self.catalog.list_collections().await?;
        Ok(stats.into_iter().map(CollectionSummary::from).collect())
    }

    async fn require_collection(&self, name: &str) -> Result<Collection, EngineError> {
        self.catalog
            .get_collection_by_name(name)
            .await?
            .ok_or_else(|| DomainError::UnknownCollection(name.to_string()).into())
    }

    /// Buffers one write (spec.md §4.5): parses+encodes it as a standalone
    /// Parquet blob, logs it in the catalog, and triggers a flush once the
    /// collection's unlocked buffer total crosses `BUFFER_SIZE`.
    pub async fn store(
        &self,
        collection_name: &str,
        timestamp: i64,
        data: &[u8],
        content_type: ContentType,
        create_collection: bool,
    ) -> Result<(), EngineError> {
        let collection = if create_collection {
            self.ensure_collection(collection_name).await?
        } else {
            self.require_collection(collection_name).await?
        };

        let hash = DedupCache::hash(data);
        if self.dedup.seen_before(collection.id, &hash) {
            tracing::debug!(collection = collection_name, %hash, "skipping duplicate write");
            return Ok(());
        }

        let buffer_uuid = Uuid::new_v4();
        let meta = RowMeta {
            timestamp,
            content_type: content_type.as_wire(),
            hash: hash.clone(),
            uuid: buffer_uuid.to_string(),
            size: 0,
            original_size: 0,
        };

        let encoded = self.bridge.write_single(collection.id, meta, content_type, data)?;

        self.blob_store
            .write(collection_name, &buffer_uuid.to_string(), encoded.bytes)
            .await?;

        catalog::log_buffer(
            self.catalog.pool(),
            collection.id,
            timestamp,
            content_type,
            encoded.size,
            encoded.original_size,
            buffer_uuid,
            &hash,
        )
        .await?;

        let unlocked_total =
            catalog::get_unlocked_buffers_size(self.catalog.pool(), collection.id).await?;
        if unlocked_total > self.buffer_size_bytes {
            self.flush(collection_name).await?;
        }

        Ok(())
    }

    /// Merges every unlocked buffer for `collection_name` into new
    /// fragments, one per content type present (spec.md §4.4-4.5). A
    /// merge failure for one content-type group unlocks that group's
    /// buffers for a future retry and is logged, not propagated.
    pub async fn flush(&self, collection_name: &str) -> Result<(), EngineError> {
        let collection = self.require_collection(collection_name).await?;

        let mut txn = self.catalog.begin().await?;
        let buffers = catalog::get_and_lock_buffers(&mut txn, collection.id).await?;
        txn.commit().await?;

        if buffers.is_empty() {
            return Ok(());
        }

        let mut by_content_type: HashMap<i32, Vec<models::BufferedFragment>> = HashMap::new();
        for buffer in buffers {
            by_content_type
                .entry(buffer.content_type.as_wire())
                .or_default()
                .push(buffer);
        }

        for (_, group) in by_content_type {
            self.flush_group(&collection, group).await?;
        }

        Ok(())
    }

    async fn flush_group(
        &self,
        collection: &Collection,
        group: Vec<models::BufferedFragment>,
    ) -> Result<(), EngineError> {
        let mut inputs = Vec::with_capacity(group.len());
        for buffer in &group {
            let bytes = self
                .blob_store
                .read(&collection.name, &buffer.uuid.to_string())
                .await?;
            inputs.push((
                RowMeta {
                    timestamp: buffer.timestamp,
                    content_type: buffer.content_type.as_wire(),
                    hash: buffer.hash.clone(),
                    uuid: buffer.uuid.to_string(),
                    size: buffer.size,
                    original_size: buffer.original_size,
                },
                buffer.content_type,
                bytes,
            ));
        }

        let timestamps: Vec<i64> = group.iter().map(|b| b.timestamp).collect();

        let merged = match self.bridge.merge(collection.id, inputs) {
            Ok(merged) => merged,
            Err(err) => {
                tracing::warn!(collection = %collection.name, error = %err, "merge failed, unlocking buffers for retry");
                catalog::flush_skipped_buffers(self.catalog.pool(), collection.id, &timestamps).await?;
                return Ok(());
            }
        };

        let fragment_id = Uuid::new_v4();
        self.blob_store
            .write(&collection.name, &fragment_id.to_string(), merged.bytes)
            .await?;

        let items: Vec<catalog::NewItem> = group
            .iter()
            .map(|b| catalog::NewItem {
                timestamp: b.timestamp,
                size: b.size,
                original_size: b.original_size,
                content_type: b.content_type,
                hash: b.hash.clone(),
            })
            .collect();

        let mut txn = self.catalog.begin().await?;
        self.catalog
            .insert_fragment(&mut txn, fragment_id, collection.id, merged.content_type)
            .await?;
        self.catalog
            .insert_items(&mut txn, fragment_id, collection.id, &items)
            .await?;
        catalog::flush_buffer(&mut txn, collection.id, &timestamps).await?;
        txn.commit().await?;

        for buffer in &group {
            if let Err(err) = self
                .blob_store
                .delete(&collection.name, &buffer.uuid.to_string())
                .await
            {
                // The buffer's catalog row is already gone; an orphaned
                // blob costs storage, not correctness (spec.md §7).
                tracing::warn!(collection = %collection.name, uuid = %buffer.uuid, error = %err, "failed to delete merged buffer blob");
            }
        }

        tracing::info!(collection = %collection.name, fragment = %fragment_id, items = items.len(), "flushed buffers into new fragment");
        Ok(())
    }

    /// Range-queries `collection_name` (spec.md §4.5.3). An unknown
    /// collection is not an error here -- it returns an empty result, same
    /// as an empty but existing one, since query paths are forgiving (spec.md
    /// §4.5.3 step 1, §8 Boundary behaviors).
    pub async fn query(
        &self,
        collection_name: &str,
        options: QueryOptions,
    ) -> Result<Vec<QueryRow>, EngineError> {
        let Some(collection) = self.catalog.get_collection_by_name(collection_name).await? else {
            return Ok(Vec::new());
        };

        let items = catalog::query_items(
            self.catalog.pool(),
            collection.id,
            options.min_timestamp,
            options.max_timestamp,
            None,
            None,
            None,
        )
        .await?;
        let buffers = catalog::query_buffers(
            self.catalog.pool(),
            collection.id,
            options.min_timestamp,
            options.max_timestamp,
        )
        .await?;

        if options.skip_data {
            let mut rows: Vec<QueryRow> = items
                .iter()
                .map(|i| QueryRow {
                    timestamp: i.timestamp,
                    content_type: i.content_type.as_wire(),
                    data: None,
                })
                .chain(buffers.iter().map(|b| QueryRow {
                    timestamp: b.timestamp,
                    content_type: b.content_type.as_wire(),
                    data: None,
                }))
                .collect();
            sort_and_paginate(&mut rows, &options);
            return Ok(rows);
        }

        let mut fragment_uuids: Vec<Uuid> = items.iter().map(|i| i.fragment_id).collect();
        fragment_uuids.sort_unstable();
        fragment_uuids.dedup();

        let mut rows = Vec::new();
        for fragment_uuid in fragment_uuids {
            let bytes = self
                .blob_store
                .read(&collection.name, &fragment_uuid.to_string())
                .await?;
            let decoded = self
                .bridge
                .read(bytes, options.min_timestamp, options.max_timestamp)?;
            for row in decoded {
                rows.push(self.decoded_row_to_query_row(row)?);
            }
        }

        for buffer in &buffers {
            let bytes = self
                .blob_store
                .read(&collection.name, &buffer.uuid.to_string())
                .await?;
            let decoded = self
                .bridge
                .read(bytes, options.min_timestamp, options.max_timestamp)?;
            for row in decoded {
                rows.push(self.decoded_row_to_query_row(row)?);
            }
        }

        sort_and_paginate(&mut rows, &options);
        Ok(rows)
    }

    /// Completes spec.md §4.3.3's `read`: the bridge decodes a fragment row
    /// into its structured payload, and this re-serializes that payload back
    /// to the wire bytes its content type's parser originally produced.
    fn decoded_row_to_query_row(&self, row: columnar::DecodedRow) -> Result<QueryRow, EngineError> {
        let content_type = ContentType::from_wire(row.meta.content_type).unwrap_or_default();
        let data = self.bridge.serialize_row(content_type, &row.payload)?;
        Ok(QueryRow {
            timestamp: row.meta.timestamp,
            content_type: row.meta.content_type,
            data: Some(data),
        })
    }

    pub async fn advanced_query(
        &self,
        collection_name: &str,
        sql: &str,
        min_timestamp: i64,
        max_timestamp: i64,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        if max_timestamp - min_timestamp > MAX_ADVANCED_QUERY_RANGE_SECONDS {
            return Err(DomainError::RangeTooWide.into());
        }

        let collection = self.require_collection(collection_name).await?;

        let items = catalog::query_items(
            self.catalog.pool(),
            collection.id,
            Some(min_timestamp),
            Some(max_timestamp),
            None,
            None,
            Some(&[ContentType::Json, ContentType::GtfsRt]),
        )
        .await?;
        let buffers = catalog::query_buffers(
            self.catalog.pool(),
            collection.id,
            Some(min_timestamp),
            Some(max_timestamp),
        )
        .await?;

        let mut keys: Vec<String> = items
            .iter()
            .map(|i| i.fragment_id.to_string())
            .chain(buffers.iter().map(|b| b.uuid.to_string()))
            .collect();
        keys.sort_unstable();
        keys.dedup();

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let paths: Vec<String> = keys
            .iter()
            .map(|key| self.blob_store.path(&collection.name, key))
            .collect();

        Ok(columnar::advanced_query(&paths, sql).await?)
    }

    pub async fn delete_collection(&self, collection_name: &str) -> Result<(), EngineError> {
        let collection = self.require_collection(collection_name).await?;
        self.blob_store.delete_collection(collection_name).await?;
        self.catalog
            .delete_collection(collection.id, collection_name)
            .await?;
        self.dedup.forget_collection(collection.id);
        Ok(())
    }

    pub async fn collection_size(&self, collection_name: &str) -> Result<i64, EngineError> {
        let collection = self.require_collection(collection_name).await?;

        let fragment_uuids = catalog::list_fragment_uuids(self.catalog.pool(), collection.id).await?;
        let mut total = 0i64;
        for uuid in fragment_uuids {
            total += self
                .blob_store
                .size(&collection.name, &uuid.to_string())
                .await? as i64;
        }

        total += catalog::get_unlocked_buffers_size(self.catalog.pool(), collection.id).await?;
        Ok(total)
    }

    /// Unlocks any buffer left `locked = true` by a process that crashed
    /// mid-flush, then attempts to flush every collection once (SPEC_FULL
    /// supplemented feature 4). Intended to run once at startup, guarded by
    /// an advisory lock so only one process instance performs it.
    pub async fn recover_on_startup(&self) -> Result<(), EngineError> {
        let pool = self.catalog.pool();
        let lock_acquired: bool = sqlx::query_scalar!(r#"select pg_try_advisory_lock(727103) as "acquired!""#)
            .fetch_one(pool)
            .await?;

        if !lock_acquired {
            tracing::info!("startup recovery already owned by another process instance");
            return Ok(());
        }

        let stats = self.catalog.list_collections().await?;
        for stat in stats {
            tracing::info!(collection = %stat.name, "running startup recovery flush");
            if let Err(err) = self.flush(&stat.name).await {
                tracing::error!(collection = %stat.name, error = %err, "startup recovery flush failed");
            }
        }

        sqlx::query!(r#"select pg_advisory_unlock(727103)"#)
            .execute(pool)
            .await?;
        Ok(())
    }
}

fn sort_and_paginate(rows: &mut Vec<QueryRow>, options: &QueryOptions) {
    if options.ascending {
        rows.sort_by_key(|r| r.timestamp);
    } else {
        rows.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
    }

    if let Some(offset) = options.offset {
        let offset = offset.max(0) as usize;
        if offset >= rows.len() {
            rows.clear();
        } else {
            rows.drain(0..offset);
        }
    }

    if let Some(limit) = options.limit {
        rows.truncate(limit.max(0) as usize);
    }
}
