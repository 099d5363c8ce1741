mod buffers;
mod collections;
mod fragments;

pub use buffers::*;
pub use collections::RawStats;
pub use fragments::{get_items_from_fragments, list_fragment_uuids, query_items, NewItem};

use lru::LruCache;
use models::Collection;
use sqlx::{PgPool, Postgres, Transaction};
use std::num::NonZeroUsize;
use std::sync::Mutex;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// The Postgres-backed metadata store (spec.md §4.4): collections,
/// fragments, buffered fragments, and items. Holds a small LRU cache over
/// `get_collection_by_name`, mirroring the original's
/// `@lru_cache(maxsize=128)` (SPEC_FULL supplemented feature 3).
pub struct Catalog {
    pool: PgPool,
    name_cache: Mutex<LruCache<String, Collection>>,
}

impl Catalog {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        MIGRATOR.run(&pool).await?;
        Ok(Catalog {
            pool,
            name_cache: Mutex::new(LruCache::new(NonZeroUsize::new(128).unwrap())),
        })
    }

    /// Wraps an already-migrated pool, e.g. one a `#[sqlx::test]` harness
    /// handed to the caller.
    pub fn from_pool(pool: PgPool) -> Self {
        Catalog {
            pool,
            name_cache: Mutex::new(LruCache::new(NonZeroUsize::new(128).unwrap())),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> sqlx::Result<Transaction<'_, Postgres>> {
        self.pool.begin().await
    }

    pub async fn create_collection(&self, name: &str) -> sqlx::Result<Collection> {
        let collection = collections::create_collection(&self.pool, name).await?;
        self.name_cache
            .lock()
            .unwrap()
            .put(name.to_string(), collection.clone());
        Ok(collection)
    }

    pub async fn get_collection_by_name(&self, name: &str) -> sqlx::Result<Option<Collection>> {
        if let Some(hit) = self.name_cache.lock().unwrap().get(name) {
            return Ok(Some(hit.clone()));
        }
        let found = collections::get_collection_by_name(&self.pool, name).await?;
        if let Some(collection) = &found {
            self.name_cache
                .lock()
                .unwrap()
                .put(name.to_string(), collection.clone());
        }
        Ok(found)
    }

    pub async fn list_collections(&self) -> sqlx::Result<Vec<RawStats>> {
        collections::list_collections(&self.pool).await
    }

    /// Deletes `name` from both Postgres and the name cache. Callers are
    /// responsible for removing the collection's blobs first.
    pub async fn delete_collection(&self, collection_id: i64, name: &str) -> sqlx::Result<()> {
        collections::delete_collection(&self.pool, collection_id).await?;
        self.name_cache.lock().unwrap().pop(name);
        Ok(())
    }

    pub async fn insert_fragment(
        &self,
        txn: &mut Transaction<'_, Postgres>,
        fragment_id: uuid::Uuid,
        collection_id: i64,
        content_type: Option<models::ContentType>,
    ) -> sqlx::Result<()> {
        fragments::insert_fragment(txn, fragment_id, collection_id, content_type).await
    }

    pub async fn insert_items(
        &self,
        txn: &mut Transaction<'_, Postgres>,
        fragment_id: uuid::Uuid,
        collection_id: i64,
        items: &[NewItem],
    ) -> sqlx::Result<()> {
        fragments::insert_items(txn, fragment_id, collection_id, items).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn create_and_fetch_collection(pool: PgPool) -> sqlx::Result<()> {
        let catalog = Catalog::from_pool(pool);

        let created = catalog.create_collection("events").await?;
        assert_eq!(created.name, "events");

        let fetched = catalog
            .get_collection_by_name("events")
            .await?
            .expect("collection should exist");
        assert_eq!(fetched.id, created.id);

        assert!(catalog.get_collection_by_name("missing").await?.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_collection_evicts_the_cache(pool: PgPool) -> sqlx::Result<()> {
        let catalog = Catalog::from_pool(pool);

        let created = catalog.create_collection("events").await?;
        catalog.delete_collection(created.id, "events").await?;
        assert!(catalog.get_collection_by_name("events").await?.is_none());
        Ok(())
    }
}
