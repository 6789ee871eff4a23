//! Authorization middleware layer.

use super::types::RoleSet;
use crate::{error::ApiError, middleware::auth::Identity, models::Role};
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use tower::{Layer, Service};
use tracing::{info, warn};

/// Authorization layer configuration.
#[derive(Debug, Clone, Copy)]
pub struct AuthzLayer {
    allowed: RoleSet,
}

impl AuthzLayer {
    pub fn new(allowed: RoleSet) -> Self {
        Self { allowed }
    }

    /// Only callers holding one of `roles` pass.
    pub fn restrict_to(roles: &[Role]) -> Self {
        Self::new(RoleSet::from_roles(roles))
    }
}

impl<S> Layer<S> for AuthzLayer {
    type Service = AuthzMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthzMiddleware {
            inner,
            allowed: self.allowed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthzMiddleware<S> {
    inner: S,
    allowed: RoleSet,
}

impl<S> Service<Request<Body>> for AuthzMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let allowed = self.allowed;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Err(err) = check(req.extensions().get::<Identity>(), allowed, req.uri().path()) {
                return Ok(err.into_response());
            }
            inner.call(req).await
        })
    }
}

fn check(identity: Option<&Identity>, allowed: RoleSet, path: &str) -> Result<(), ApiError> {
    let Some(identity) = identity else {
        warn!(path = %path, "Authorization check without authentication");
        return Err(ApiError::NotLoggedIn);
    };

    if !allowed.contains(identity.role) {
        info!(
            event = "authz_denied",
            user_id = %identity.id,
            role = %identity.role,
            allowed = %allowed,
            path = %path,
        );
        return Err(ApiError::Forbidden);
    }

    Ok(())
}
