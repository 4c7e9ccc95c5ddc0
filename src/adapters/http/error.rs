//! Uniform HTTP error mapping.
//!
//! Domain error codes map onto status codes at this boundary; callers see
//! an error envelope, never internal detail or a stack trace.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::foundation::{DomainError, ErrorCode};

/// DomainError wrapper implementing axum's response conversion.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::SubscriptionNotFound | ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadRequest | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "Internal error".to_string()
        } else {
            self.0.message.clone()
        };

        (
            status,
            Json(json!({
                "code": self.0.code.to_string(),
                "message": message,
            })),
        )
            .into_response()
    }
}
