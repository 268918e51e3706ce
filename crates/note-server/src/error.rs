//! Mapping of note errors onto HTTP responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use note_core::NoteError;
use serde_json::json;

/// Error response returned by every note handler
#[derive(Debug)]
pub struct ApiError(pub NoteError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            NoteError::NotFound(_) => StatusCode::NOT_FOUND,
            NoteError::Validation(_) => StatusCode::BAD_REQUEST,
            NoteError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            NoteError::Serialization(_) | NoteError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<NoteError> for ApiError {
    fn from(e: NoteError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(NoteError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}
