// HTTP error mapping
// Every failure leaves the service as {"status": "error", "message": ...}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::scoring::EngineError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong API key (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Request understood but unusable (400)
    #[error("{0}")]
    BadRequest(String),

    /// Body rejected before it reached the handler: schema (422), missing
    /// JSON content type (415) or over the size limit (413)
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    /// Internal server error (500); detail is logged, never returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidBody { status, message } => (status, message),
            ApiError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::InputError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("API key missing".into()), StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("Empty audio file".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::InvalidBody {
                    status: StatusCode::PAYLOAD_TOO_LARGE,
                    message: "length limit exceeded".into(),
                },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ApiError::Internal("join failed".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_engine_error_is_bad_request() {
        let error: ApiError = EngineError::MalformedInput(InputError::NonFinite).into();
        assert!(matches!(error, ApiError::BadRequest(ref msg) if msg.contains("no finite samples")));
    }
}
