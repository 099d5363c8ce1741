pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use std::sync::Arc;

use catalog::Catalog;
use columnar::ColumnarBridge;
use engine::Engine;

use crate::config::Settings;
use crate::state::AppState;

/// Wires a fully running `Engine` from `settings`, the shared construction
/// path `main` and the black-box tests both use.
pub async fn build_app_state(settings: &Settings) -> anyhow::Result<AppState> {
    let catalog = Catalog::connect(&settings.db_url).await?;
    let blob_store = settings.build_blob_store()?;
    let bridge = ColumnarBridge::new(settings.merge_compression());

    let engine = Arc::new(Engine::new(blob_store, Arc::new(catalog), bridge, settings.buffer_size_bytes()));
    Ok(AppState { engine })
}
