//! Error context utilities.

use super::types::ApiError;

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Wrap the failure as an internal error with `context` attached.
    fn context(self, context: impl Into<String>) -> Result<T, ApiError>;

    /// Turn the failure into a not-found error for `resource`.
    fn not_found(self, resource: &'static str) -> Result<T, ApiError>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ErrorContext<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::Internal(anyhow::Error::from(e).context(context.into())))
    }

    fn not_found(self, resource: &'static str) -> Result<T, ApiError> {
        self.map_err(|_| ApiError::NotFound { resource })
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::Internal(anyhow::anyhow!(context.into())))
    }

    fn not_found(self, resource: &'static str) -> Result<T, ApiError> {
        self.ok_or(ApiError::NotFound { resource })
    }
}
