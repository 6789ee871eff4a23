//! Per-request context stamped at pipeline entry.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, Response},
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::{
    convert::Infallible,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// When the request entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTime(pub DateTime<Utc>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestTime
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestTime>()
            .copied()
            .unwrap_or_else(|| RequestTime(Utc::now())))
    }
}

/// Stamps [`RequestTime`] into the request extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestTimeLayer;

impl<S> Layer<S> for RequestTimeLayer {
    type Service = RequestTimeMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTimeMiddleware { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestTimeMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for RequestTimeMiddleware<S>
where
    S: Service<Request, Response = Response<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        req.extensions_mut().insert(RequestTime(Utc::now()));
        Box::pin(self.inner.call(req))
    }
}
