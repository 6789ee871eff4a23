//! Authentication extractors for handlers.

use super::types::Identity;
use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Identity of an authenticated caller. Rejects with 401 when the route is
/// not behind the authentication gate.
pub struct Auth(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Auth)
            .ok_or(ApiError::NotLoggedIn)
    }
}
