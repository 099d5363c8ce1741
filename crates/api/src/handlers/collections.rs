use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::MessageBody;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CollectionSummaryBody {
    pub name: String,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    pub count: i64,
}

impl From<engine::CollectionSummary> for CollectionSummaryBody {
    fn from(summary: engine::CollectionSummary) -> Self {
        CollectionSummaryBody {
            name: summary.name,
            min_timestamp: summary.min_timestamp,
            max_timestamp: summary.max_timestamp,
            count: summary.count,
        }
    }
}

/// `GET /collections/` (spec.md §6).
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionSummaryBody>>, ApiError> {
    let summaries = state.engine.list_collections().await?;
    Ok(Json(summaries.into_iter().map(CollectionSummaryBody::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    #[serde(default)]
    pub allow_existing: bool,
}

/// `POST /collection/` (spec.md §6).
pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    state.engine.create_collection(&request.name, request.allow_existing).await?;
    Ok(Json(MessageBody::new(format!("created collection '{}'", request.name))))
}
