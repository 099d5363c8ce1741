use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SizeResponse {
    pub size: i64,
}

/// `GET /size/{name}` (SPEC_FULL supplemented feature 6).
pub async fn collection_size(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SizeResponse>, ApiError> {
    let size = state.engine.collection_size(&name).await?;
    Ok(Json(SizeResponse { size }))
}
