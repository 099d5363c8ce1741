use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::handlers::MessageBody;
use crate::state::AppState;

/// `DELETE /delete/{name}` (spec.md §6).
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    state.engine.delete_collection(&name).await?;
    Ok(Json(MessageBody::new(format!("deleted '{name}'"))))
}
