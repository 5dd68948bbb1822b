use crate::StashError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// HTTP wrapper for [`StashError`].
///
/// Client-caused failures map to fixed 4xx messages; everything else is
/// collapsed into a generic 500 so internals never leak into responses.
#[derive(Debug)]
pub struct ApiError(pub StashError);

impl From<StashError> for ApiError {
    #[inline]
    fn from(error: StashError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StashError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            StashError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            StashError::NotFound(_) => (StatusCode::NOT_FOUND, "Snippet not found"),
            _ => {
                error!("Request failed: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
