//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::payments::PaymentError;
use crate::services::activation::ActivationError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payment provider operation failed.
    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),

    /// Purchase activation failed.
    #[error("Activation error: {0}")]
    Activation(#[from] ActivationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Payment(_)
        ) || matches!(self, Self::Activation(ActivationError::Repository(_)))
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Activation(err) => match err {
                ActivationError::UnknownSession(_) => StatusCode::NOT_FOUND,
                ActivationError::NotPaid(_) | ActivationError::AlreadyCompleted(_) => {
                    StatusCode::CONFLICT
                }
                ActivationError::MissingEmail(_) | ActivationError::InvalidEmail(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ActivationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Payment(_) => "Payment provider error".to_string(),
            Self::Activation(err) => match err {
                ActivationError::UnknownSession(_) => "No purchase found for this session".to_string(),
                ActivationError::NotPaid(_) => {
                    "Payment has not completed yet; try again shortly".to_string()
                }
                ActivationError::AlreadyCompleted(_) => {
                    "This purchase was already activated".to_string()
                }
                ActivationError::MissingEmail(_) => {
                    "No email available for this purchase; please provide one".to_string()
                }
                ActivationError::InvalidEmail(_) => "Invalid email address".to_string(),
                ActivationError::Repository(_) => "Internal server error".to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("purchase-123".to_string());
        assert_eq!(err.to_string(), "Not found: purchase-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_activation_error_status_codes() {
        fn get_status(err: ActivationError) -> StatusCode {
            AppError::from(err).into_response().status()
        }

        assert_eq!(
            get_status(ActivationError::UnknownSession("cs_1".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ActivationError::NotPaid("cs_1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ActivationError::AlreadyCompleted("cs_1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ActivationError::MissingEmail("cs_1".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
