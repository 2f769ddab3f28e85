use axum::{http::StatusCode, response::IntoResponse, Json};
use postbox_core::{ServiceError, ValidationError};

use crate::dto::ErrorResponse;

/// An error rendered as `{"error": ...}` with a status code.
///
/// Only caller-facing text goes into the body; backend details stay in the logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a create-message failure
    pub fn from_create(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(ValidationError::InvalidPayload(message)) => {
                Self::bad_request(message)
            }
            ServiceError::Validation(ValidationError::MissingField(field)) => {
                Self::bad_request(format!("Field '{}' is required and must be a string", field))
            }
            ServiceError::Rejected { category, reason } => {
                Self::unprocessable(format!("Message rejected by moderation ({}): {}", category, reason))
            }
            ServiceError::Persistence(_) => Self::internal_server_error("Failed to store message"),
        }
    }

    /// Map a list-messages failure
    pub fn from_list(_err: ServiceError) -> Self {
        Self::internal_server_error("Failed to read messages")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}
