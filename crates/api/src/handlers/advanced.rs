use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdvancedQueryRequest {
    pub min_timestamp: i64,
    pub max_timestamp: i64,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AdvancedQueryResponse {
    pub results: Vec<serde_json::Value>,
}

/// `POST /advanced/{name}/` (spec.md §6, §4.5.4). `query` must reference
/// `[table]`; it is otherwise passed through to DataFusion unsanitized
/// (spec.md §9's open question, resolved in DESIGN.md as trusted input).
pub async fn advanced_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<AdvancedQueryRequest>,
) -> Result<Json<AdvancedQueryResponse>, ApiError> {
    let results = state
        .engine
        .advanced_query(&name, &request.query, request.min_timestamp, request.max_timestamp)
        .await?;

    Ok(Json(AdvancedQueryResponse { results }))
}
