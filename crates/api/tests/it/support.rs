use std::sync::Arc;

use api::state::AppState;
use catalog::Catalog;
use columnar::{ColumnarBridge, Compression};
use engine::Engine;
use sqlx::PgPool;

/// Builds an `AppState` wired to a real (test-harness) Postgres pool and a
/// tempdir-backed filesystem blob store, the same shape `test_engine` uses
/// in `engine/tests/store_flush_query.rs` -- the router under test talks to
/// this the same way it talks to a production `Engine`.
pub fn test_state(pool: PgPool, root: &std::path::Path, buffer_size_bytes: i64) -> AppState {
    let blob_store = Arc::new(blob_store::FileSystemBlobStore::new(root));
    let catalog = Arc::new(Catalog::from_pool(pool));
    let bridge = ColumnarBridge::new(Compression::SNAPPY);
    AppState {
        engine: Arc::new(Engine::new(blob_store, catalog, bridge, buffer_size_bytes)),
    }
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
