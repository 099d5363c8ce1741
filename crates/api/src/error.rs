use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use engine::EngineError;
use models::{DomainError, Invariant};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Every API error maps to HTTP 400 (spec.md §6, §7) -- there is no 5xx
/// status in this surface, but the `tracing::error!`-vs-not split the
/// teacher's `AppError::into_response` makes between expected and
/// unexpected failures still applies: `Invariant` and `DomainError` are
/// caller mistakes and are logged at `debug`, while catalog/blob-store/
/// columnar failures are infrastructure faults and are logged at `error`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Invariant(#[from] Invariant),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Engine(EngineError::BlobStore(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            ApiError::Domain(_) | ApiError::Invariant(_) | ApiError::BadRequest(_) => {
                tracing::debug!(error = %self, "request rejected");
            }
            ApiError::Engine(EngineError::Domain(_)) | ApiError::Engine(EngineError::Invariant(_)) => {
                tracing::debug!(error = %self, "request rejected");
            }
            ApiError::Engine(_) => {
                tracing::error!(error = %self, "request failed");
            }
        }

        let body = Json(ErrorBody { error: self.to_string() });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
