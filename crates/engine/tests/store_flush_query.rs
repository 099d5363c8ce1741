use blob_store::FileSystemBlobStore;
use catalog::Catalog;
use columnar::{Compression, ColumnarBridge};
use engine::{Engine, QueryOptions};
use models::ContentType;
use sqlx::PgPool;
use std::sync::Arc;

fn test_engine(pool: PgPool, root: &std::path::Path, buffer_size_bytes: i64) -> Engine {
    let blob_store = Arc::new(FileSystemBlobStore::new(root));
    let catalog = Arc::new(Catalog::from_pool(pool));
    let bridge = ColumnarBridge::new(Compression::SNAPPY);
    Engine::new(blob_store, catalog, bridge, buffer_size_bytes)
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn store_then_query_returns_the_write(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = test_engine(pool, dir.path(), 64 * 1024 * 1024);

    engine
        .store("events", 100, br#"{"a":1}"#, ContentType::Json, true)
        .await
        .expect("store failed");

    let rows = engine
        .query(
            "events",
            QueryOptions {
                min_timestamp: None,
                max_timestamp: None,
                ascending: true,
                limit: None,
                offset: None,
                skip_data: false,
            },
        )
        .await
        .expect("query failed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, 100);
    let data: serde_json::Value = serde_json::from_slice(rows[0].data.as_ref().unwrap()).unwrap();
    assert_eq!(data["a"], 1);
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn flush_merges_buffers_into_a_fragment(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = test_engine(pool, dir.path(), 64 * 1024 * 1024);

    engine
        .store("events", 1, br#"{"a":1}"#, ContentType::Json, true)
        .await
        .unwrap();
    engine
        .store("events", 2, br#"{"a":2}"#, ContentType::Json, false)
        .await
        .unwrap();

    engine.flush("events").await.expect("flush failed");

    let rows = engine
        .query(
            "events",
            QueryOptions {
                min_timestamp: None,
                max_timestamp: None,
                ascending: true,
                limit: None,
                offset: None,
                skip_data: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].timestamp, 1);
    assert_eq!(rows[1].timestamp, 2);
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn duplicate_writes_are_deduplicated(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = test_engine(pool, dir.path(), 64 * 1024 * 1024);

    let payload = br#"{"a":1}"#;
    engine.store("events", 1, payload, ContentType::Json, true).await.unwrap();
    engine.store("events", 1, payload, ContentType::Json, false).await.unwrap();

    let size = engine.collection_size("events").await.unwrap();
    assert!(size > 0);

    let rows = engine
        .query(
            "events",
            QueryOptions {
                min_timestamp: None,
                max_timestamp: None,
                ascending: true,
                limit: None,
                offset: None,
                skip_data: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn querying_an_unknown_collection_is_forgiving(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = test_engine(pool, dir.path(), 64 * 1024 * 1024);

    let rows = engine
        .query(
            "missing",
            QueryOptions {
                min_timestamp: None,
                max_timestamp: None,
                ascending: true,
                limit: None,
                offset: None,
                skip_data: false,
            },
        )
        .await
        .expect("query on an unknown collection should not error");

    assert!(rows.is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn storing_to_an_unknown_collection_without_create_fails(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = test_engine(pool, dir.path(), 64 * 1024 * 1024);

    let err = engine
        .store("missing", 1, br#"{"a":1}"#, ContentType::Json, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        engine::EngineError::Domain(models::DomainError::UnknownCollection(_))
    ));
    Ok(())
}

#[sqlx::test(migrations = "../catalog/migrations")]
async fn create_collection_rejects_duplicates_unless_allowed(pool: PgPool) -> sqlx::Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = test_engine(pool, dir.path(), 64 * 1024 * 1024);

    engine.create_collection("events", false).await.unwrap();

    let err = engine.create_collection("events", false).await.unwrap_err();
    assert!(matches!(
        err,
        engine::EngineError::Domain(models::DomainError::CollectionExists(_))
    ));

    engine
        .create_collection("events", true)
        .await
        .expect("allow_existing should tolerate the duplicate");
    Ok(())
}
