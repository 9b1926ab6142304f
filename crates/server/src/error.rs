use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    /// Maps an application failure to its wire form and logs it under a fresh
    /// correlation id.
    pub fn from_application(operation: &'static str, error: impl Into<ApplicationError>) -> Self {
        let error = error.into();
        let correlation_id = Uuid::new_v4().to_string();
        let interface = error.clone().into_interface(correlation_id.as_str());

        match interface {
            InterfaceError::Internal { .. } => error!(
                event_name = "api.request.failed",
                operation,
                correlation_id = %correlation_id,
                error = %error,
                "request failed"
            ),
            InterfaceError::NotFound { .. }
            | InterfaceError::Unprocessable { .. }
            | InterfaceError::PayloadTooLarge { .. } => warn!(
                event_name = "api.request.rejected",
                operation,
                correlation_id = %correlation_id,
                error = %error,
                "request rejected"
            ),
        }

        Self(interface)
    }

    /// Malformed request bodies and multipart streams.
    pub fn unprocessable(operation: &'static str, message: impl Into<String>) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let message = message.into();
        warn!(
            event_name = "api.request.invalid",
            operation,
            correlation_id = %correlation_id,
            detail = %message,
            "request body rejected"
        );
        Self(InterfaceError::Unprocessable { message, correlation_id })
    }

    /// Multipart stream failures. A body over the route's limit stays a 413;
    /// anything else is a malformed request.
    pub fn from_multipart(operation: &'static str, error: MultipartError) -> Self {
        if error.status() != StatusCode::PAYLOAD_TOO_LARGE {
            return Self::unprocessable(operation, error.body_text());
        }

        let correlation_id = Uuid::new_v4().to_string();
        let message = error.body_text();
        warn!(
            event_name = "api.request.too_large",
            operation,
            correlation_id = %correlation_id,
            detail = %message,
            "request body exceeds limit"
        );
        Self(InterfaceError::PayloadTooLarge { message, correlation_id })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody { detail: self.0.detail().to_string() })).into_response()
    }
}
