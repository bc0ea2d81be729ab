//! JSON error responses

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::common::PortalError;

/// Body: `{"error": "<Kind>", "message": "<detail>"}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "a valid session token is required",
        )
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "not allowed to act for this customer",
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Unavailable", message)
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        let message = err.to_string();
        match err {
            PortalError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "NotFound", message),
            PortalError::Expired => Self::new(StatusCode::GONE, "Expired", message),
            PortalError::Mismatch => Self::new(StatusCode::BAD_REQUEST, "Mismatch", message),
            PortalError::Invalid(_) => Self::new(StatusCode::BAD_REQUEST, "Invalid", message),
            PortalError::InvalidTransition(_) => {
                Self::new(StatusCode::CONFLICT, "InvalidTransition", message)
            }
            // Retries were exhausted; to the caller this is a transient failure
            PortalError::Conflict | PortalError::Unavailable(_) => Self::unavailable(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(kind = self.kind, message = %self.message, "Request failed");
        }

        let body = Json(ErrorBody {
            error: self.kind,
            message: &self.message,
        });
        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from_static("3"));
        }
        response
    }
}
