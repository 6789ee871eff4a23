//! API error types.

use axum::http::StatusCode;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Field name to the list of messages that failed for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error enum covering all error cases.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid input data. {}", join_field_errors(.0))]
    ValidationError(FieldErrors),

    #[error("Invalid route parameter: {0}")]
    InvalidId(String),

    // 413 Payload Too Large
    #[error("Request body is larger than the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    // 401 Unauthorized
    #[error("You are not logged in! Please log in to get access.")]
    NotLoggedIn,

    #[error("Invalid token. Please log in again!")]
    InvalidToken,

    #[error("Your token has expired! Please log in again.")]
    TokenExpired,

    #[error("The user belonging to this token does no longer exist.")]
    UserNoLongerExists,

    #[error("User recently changed password! Please log in again.")]
    PasswordChanged,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Your current password is wrong.")]
    WrongCurrentPassword,

    // 403 Forbidden
    #[error("You do not have permission to perform this action")]
    Forbidden,

    // 404 Not Found
    #[error("Can't find {0} on this server!")]
    RouteNotFound(String),

    #[error("No {resource} found with that ID")]
    NotFound { resource: &'static str },

    // 408 Request Timeout
    #[error("Request took too long to process. Please try again.")]
    RequestTimeout,

    // 409 Conflict
    #[error("Duplicate field value: {0}. Please use another value!")]
    Duplicate(String),

    // 429 Too Many Requests
    #[error("{message}")]
    RateLimited { message: String, retry_after: u64 },

    // 500 Internal Server Error
    #[error("Something went very wrong!")]
    Internal(#[source] anyhow::Error),
}

fn join_field_errors(fields: &FieldErrors) -> String {
    fields
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
        .collect::<Vec<_>>()
        .join(". ")
}

impl ApiError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::ValidationError(_)
            | Self::InvalidId(_) => StatusCode::BAD_REQUEST,

            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            Self::NotLoggedIn
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::UserNoLongerExists
            | Self::PasswordChanged
            | Self::InvalidCredentials
            | Self::WrongCurrentPassword => StatusCode::UNAUTHORIZED,

            Self::Forbidden => StatusCode::FORBIDDEN,

            Self::RouteNotFound(_)
            | Self::NotFound { .. } => StatusCode::NOT_FOUND,

            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,

            Self::Duplicate(_) => StatusCode::CONFLICT,

            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidId(_) => "invalid_id",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::NotLoggedIn => "not_logged_in",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::UserNoLongerExists => "user_no_longer_exists",
            Self::PasswordChanged => "password_changed",
            Self::InvalidCredentials => "invalid_credentials",
            Self::WrongCurrentPassword => "wrong_current_password",
            Self::Forbidden => "forbidden",
            Self::RouteNotFound(_) => "route_not_found",
            Self::NotFound { .. } => "not_found",
            Self::RequestTimeout => "request_timeout",
            Self::Duplicate(_) => "duplicate",
            Self::RateLimited { .. } => "rate_limited",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Operational errors are anticipated failures whose message is safe to
    /// show verbatim.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Check if this is an authentication failure.
    pub fn is_auth_error(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
            || self.status_code() == StatusCode::FORBIDDEN
    }

    /// Check if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// `fail` for client errors, `error` for server errors.
    pub fn status_label(&self) -> &'static str {
        if self.is_server_error() {
            "error"
        } else {
            "fail"
        }
    }
}
