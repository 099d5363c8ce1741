use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::handlers::MessageBody;
use crate::state::AppState;

/// `POST /flush/{name}` (spec.md §6).
pub async fn flush(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<MessageBody>, ApiError> {
    state.engine.flush(&name).await?;
    Ok(Json(MessageBody::new(format!("flushed '{name}'"))))
}
