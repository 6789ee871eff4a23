//! Request handlers, one module per resource.

pub mod auth;
pub mod reviews;
pub mod tours;
pub mod users;
pub mod views;

use crate::error::{ApiError, ErrorReport};
use axum::{
    extract::{OriginalUri, Request},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower::{timeout::error::Elapsed, BoxError};

/// Answer for any route nothing else matched.
pub async fn fallback(OriginalUri(uri): OriginalUri) -> ApiError {
    route_not_found(&uri)
}

/// A known path asked for with a verb it does not serve is answered like an
/// unknown route rather than with a bare 405.
pub async fn unmatched_method(req: Request, next: Next) -> Response {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| req.uri().clone());

    let response = next.run(req).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED
        && response.extensions().get::<ErrorReport>().is_none()
    {
        return route_not_found(&uri).into_response();
    }
    response
}

/// Error handler for the request timeout stage.
pub async fn timeout_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::RequestTimeout
    } else {
        ApiError::Internal(anyhow::anyhow!(err))
    }
}

fn route_not_found(uri: &Uri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::RouteNotFound(target)
}
