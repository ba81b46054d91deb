//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Wire contract: every domain failure is reported as 401 with a
//! `{message}` body. Infrastructure failures (database, internal) are
//! the only 500s.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing/empty required field
    #[error("{0}")]
    Validation(String),

    /// Username collides with an active user
    #[error("username is already in use")]
    UsernameTaken,

    /// Email collides with an active user
    #[error("email is already in use")]
    EmailTaken,

    /// Unknown user or wrong password
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Account exists but login is not allowed
    #[error("account is disabled")]
    AccountDisabled,

    /// Wrong or missing two-factor code
    #[error("incorrect 2FA code")]
    IncorrectCode,

    /// Password reset requested for an unknown email
    #[error("invalid email")]
    InvalidEmail,

    /// Unknown or expired password-reset token
    #[error("invalid reset token")]
    InvalidResetToken,

    /// Generic authentication failure (bad bearer token, unknown subject)
    #[error("unauthorized")]
    Unauthorized,

    /// System roles can never be disabled or deleted
    #[error("protected system role cannot be modified")]
    ProtectedRole,

    /// External authorization provider failure
    #[error("authorization provider error: {0}")]
    Provider(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
            _ => ErrorKind::Unauthorized,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Provider(msg) => {
                tracing::warn!(message = %msg, "Authorization provider failure");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::IncorrectCode => {
                tracing::warn!("Incorrect 2FA code");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
