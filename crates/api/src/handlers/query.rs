use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use engine::QueryOptions;

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    #[serde(default)]
    pub ascending: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub skip_data: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryRowBody {
    pub timestamp: i64,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub results: Vec<QueryRowBody>,
}

/// `GET /query/{name}` (spec.md §6). `data` is hex-encoded, `""` when
/// `skip_data` was requested or the row carried no payload.
pub async fn query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    let rows = state
        .engine
        .query(
            &name,
            QueryOptions {
                min_timestamp: params.min_timestamp,
                max_timestamp: params.max_timestamp,
                ascending: params.ascending,
                limit: params.limit,
                offset: params.offset,
                skip_data: params.skip_data,
            },
        )
        .await?;

    let results = rows
        .into_iter()
        .map(|row| QueryRowBody {
            timestamp: row.timestamp,
            data: row.data.map(|bytes| hex::encode(bytes)).unwrap_or_default(),
        })
        .collect();

    Ok(Json(QueryResponse { results }))
}
