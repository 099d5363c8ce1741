use axum::extract::{Path, State};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::MessageBody;
use crate::state::AppState;
use models::ContentType;

#[derive(Debug, Deserialize)]
struct StoreMetadata {
    timestamp: i64,
    #[serde(default)]
    content_type: Option<i32>,
    #[serde(default)]
    create_collection: bool,
}

/// `POST /store/{name}/` (spec.md §6). The request body is
/// `json-metadata\n<raw-bytes>`: a line of JSON metadata, a newline, then
/// the payload bytes verbatim.
pub async fn store(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<MessageBody>, ApiError> {
    let split_at = body
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| ApiError::BadRequest("store body must contain a metadata line followed by '\\n'".to_string()))?;

    let (metadata_line, rest) = body.split_at(split_at);
    let payload = &rest[1..];

    let metadata: StoreMetadata = serde_json::from_slice(&metadata_line)
        .map_err(|err| ApiError::BadRequest(format!("invalid store metadata: {err}")))?;

    let content_type = metadata
        .content_type
        .and_then(ContentType::from_wire)
        .unwrap_or_default();

    state
        .engine
        .store(&name, metadata.timestamp, payload, content_type, metadata.create_collection)
        .await?;

    Ok(Json(MessageBody::new(format!("stored 1 item in '{name}'"))))
}
