//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error is rendered as `{ "message": ... }`.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::uploads::UploadError;

/// Whether 500 responses include the underlying error text.
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Include internal error detail in 500 responses (development only).
pub fn expose_internal_errors(enabled: bool) {
    EXPOSE_INTERNAL_ERRORS.store(enabled, Ordering::Relaxed);
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Upload rejected or could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired session token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated with the wrong role.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (or not owned by the caller).
    #[error("{0}")]
    NotFound(String),

    /// Duplicate or state conflict.
    #[error("{0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Too many requests")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => Self::status_of_repository(err),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::Validation(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidOrExpiredOtp
                | AuthError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials | AuthError::WrongCurrentPassword => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists(_) => StatusCode::CONFLICT,
                AuthError::Repository(inner) => Self::status_of_repository(inner),
                AuthError::Token(_) | AuthError::Email(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Upload(err) => match err {
                UploadError::UnsupportedType | UploadError::TooLarge { .. } | UploadError::Empty => {
                    StatusCode::BAD_REQUEST
                }
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn status_of_repository(err: &RepositoryError) -> StatusCode {
        match err {
            RepositoryError::NotFound => StatusCode::NOT_FOUND,
            RepositoryError::Conflict(_) | RepositoryError::Lifecycle(_) => StatusCode::CONFLICT,
            RepositoryError::Money(_) => StatusCode::BAD_REQUEST,
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Internal details are never included here.
    fn public_message(&self) -> String {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                RepositoryError::Lifecycle(e) => e.to_string(),
                RepositoryError::Money(e) => e.to_string(),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Validation(msg) | AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::PasswordMismatch => "Passwords do not match".to_string(),
                AuthError::InvalidOrExpiredOtp => "Invalid or expired OTP".to_string(),
                AuthError::InvalidOrExpiredToken => "Invalid or expired reset token".to_string(),
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::WrongCurrentPassword => "Current password is incorrect".to_string(),
                AuthError::UserNotFound => "User not found".to_string(),
                AuthError::UserAlreadyExists(what) => format!("{what} already registered"),
                _ => "Internal server error".to_string(),
            },
            Self::Upload(UploadError::Io(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        let error = if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            EXPOSE_INTERNAL_ERRORS
                .load(Ordering::Relaxed)
                .then(|| self.to_string())
        } else {
            None
        };

        let body = ErrorBody {
            message: self.public_message(),
            error,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Validation(err.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called by the auth extractors once a token is validated.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use selempangku_core::{LifecycleError, MAX_TOTAL, MoneyError, OrderEvent, OrderStatus};

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AuthError::UserAlreadyExists("Email").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AuthError::InvalidOrExpiredOtp.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AuthError::UserNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_lifecycle_error_is_conflict() {
        let err = RepositoryError::Lifecycle(LifecycleError::InvalidOrderTransition {
            from: OrderStatus::Completed,
            event: OrderEvent::Cancelled,
        });
        assert_eq!(status(err.into()), StatusCode::CONFLICT);
    }

    fn repository_cases() -> [(RepositoryError, StatusCode); 3] {
        [
            (RepositoryError::NotFound, StatusCode::NOT_FOUND),
            (RepositoryError::Conflict("taken".into()), StatusCode::CONFLICT),
            (
                RepositoryError::DataCorruption("bad".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ]
    }

    #[test]
    fn test_repository_errors_map_alike_everywhere() {
        for (err, expected) in repository_cases() {
            assert_eq!(status(err.into()), expected);
        }
        for (err, expected) in repository_cases() {
            assert_eq!(status(AuthError::Repository(err).into()), expected);
        }
    }

    #[test]
    fn test_oversized_amount_is_bad_request() {
        let err = RepositoryError::Money(MoneyError::TooLarge {
            field: "Total",
            max: MAX_TOTAL,
        });
        let app_err = AppError::from(err);
        assert_eq!(app_err.public_message(), "Total must not exceed 99999999999999.99");
        assert_eq!(status(app_err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AppError::Internal("connection refused at 10.0.0.5".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_error_envelope_body() {
        let response = AppError::NotFound("Order not found".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "Order not found" }));
    }
}
