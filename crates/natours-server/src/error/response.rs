//! Error response implementation.

use super::types::ApiError;
use crate::repository::RepositoryError;
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::error::Error as _;
use tracing::{error, warn};

/// Production-shape error body.
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    status: &'static str,
    message: &'a str,
}

/// Everything the error boundary needs to re-render an error with full
/// diagnostics. Attached to every error response as an extension.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status_code: u16,
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
    /// Message of the underlying failure, even when `message` is generic.
    pub raw_message: String,
    pub operational: bool,
    /// `Debug` rendering of the original error value.
    pub detail: String,
    /// Display of each error in the source chain, outermost first.
    pub stack: Vec<String>,
}

impl ErrorReport {
    fn from_error(err: &ApiError) -> Self {
        let mut stack = vec![err.to_string()];
        match err {
            ApiError::Internal(inner) => stack.extend(inner.chain().map(|e| e.to_string())),
            _ => {
                let mut source = err.source();
                while let Some(e) = source {
                    stack.push(e.to_string());
                    source = e.source();
                }
            }
        }

        Self {
            status_code: err.status_code().as_u16(),
            status: err.status_label(),
            code: err.error_code(),
            message: err.to_string(),
            raw_message: match err {
                ApiError::Internal(inner) => inner.to_string(),
                _ => err.to_string(),
            },
            operational: err.is_operational(),
            detail: format!("{err:?}"),
            stack,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(
                error = %self,
                detail = ?self,
                code = self.error_code(),
                "Server error occurred"
            );
        } else if self.is_auth_error() {
            warn!(
                error = %self,
                code = self.error_code(),
                "Auth error occurred"
            );
        }

        let report = ErrorReport::from_error(&self);
        let body = ErrorResponse {
            status: report.status,
            message: &report.message,
        };

        let mut response = (self.status_code(), Json(body)).into_response();

        if let ApiError::RateLimited { retry_after, .. } = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
        }

        response.extensions_mut().insert(report);
        response
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => ApiError::TokenExpired,
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("failed {} check", e.code))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        ApiError::ValidationError(fields)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate { value, .. } => ApiError::Duplicate(value),
            RepositoryError::Invalid(message) => ApiError::BadRequest(message),
            RepositoryError::Serialization(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_operational_error_body() {
        let response = ApiError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.extensions().get::<ErrorReport>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "You do not have permission to perform this action");
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        let report = response.extensions().get::<ErrorReport>().cloned().unwrap();
        assert!(!report.operational);
        assert!(report.stack.iter().any(|line| line.contains("disk on fire")));

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Something went very wrong!");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            message: "Too many".into(),
            retry_after: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_jwt_expired_maps_to_token_expired() {
        let err: jsonwebtoken::errors::Error =
            jsonwebtoken::errors::ErrorKind::ExpiredSignature.into();
        assert!(matches!(ApiError::from(err), ApiError::TokenExpired));

        let err: jsonwebtoken::errors::Error =
            jsonwebtoken::errors::ErrorKind::InvalidSignature.into();
        assert!(matches!(ApiError::from(err), ApiError::InvalidToken));
    }
}
