//! Mapping of [`PaymentError`] onto HTTP responses.
//!
//! Client errors echo the domain message. Storage and internal failures are
//! logged in full and answered with a fixed message.

use crate::error::{FieldErrors, PaymentError};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Body of every non-validation error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ApiError(pub PaymentError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::Precondition { .. }
            | PaymentError::Processing { .. }
            | PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
            PaymentError::Storage(_) | PaymentError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn field_error(field: &str, message: String) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message);
        Self(PaymentError::Validation(errors))
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::field_error("body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::field_error("id", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self.0 {
            PaymentError::Validation(errors) => {
                tracing::warn!(fields = ?errors.keys().collect::<Vec<_>>(), "Validation failed");
                return (status, Json(errors)).into_response();
            }
            ref err if err.is_client_error() => err.to_string(),
            ref err => {
                tracing::error!(error = %err, "Unexpected error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        let body = ErrorResponse {
            status: status.as_u16(),
            message,
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
