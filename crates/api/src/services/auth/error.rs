//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;

use super::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] selempangku_core::EmailError),

    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Invalid credentials (wrong password, unknown email, or wrong role).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The current password given for a password change is wrong.
    #[error("current password is incorrect")]
    WrongCurrentPassword,

    /// No account uses this email.
    #[error("user not found")]
    UserNotFound,

    /// Email or username already registered.
    #[error("{0} already registered")]
    UserAlreadyExists(&'static str),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Registration OTP absent, wrong, or past its expiry.
    #[error("invalid or expired OTP")]
    InvalidOrExpiredOtp,

    /// Password reset token absent, wrong, or past its expiry.
    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,

    /// Session token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Outbound email failed.
    #[error("email error: {0}")]
    Email(#[from] EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
