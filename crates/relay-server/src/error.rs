use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::RelayError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    MissingUserHeader,
    InvalidBody(JsonRejection),
    Relay(RelayError),
}

pub type Result<T> = core::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::MissingUserHeader => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "\"User\" header is required".to_string(),
            ),
            ApiError::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Relay(err) => {
                let status = match &err {
                    RelayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    RelayError::Conflict(_) => StatusCode::CONFLICT,
                    RelayError::NotFound(_) => StatusCode::NOT_FOUND,
                    RelayError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!("Request failed: {}", err);
                }
                (status, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection)
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError::Relay(err)
    }
}
