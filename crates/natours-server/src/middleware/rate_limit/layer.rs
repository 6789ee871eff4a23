//! Rate limit middleware layer.

use super::{
    store::{InMemoryStore, RateLimitResult, RateLimitStore},
    types::{KeyStrategy, RateLimitPolicy},
};
use crate::error::ApiError;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{header::HeaderName, HeaderMap, HeaderValue, Response},
    response::IntoResponse,
};
use futures::future::BoxFuture;
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Rate limit layer.
#[derive(Clone)]
pub struct RateLimitLayer {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimitLayer {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            policy,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = store;
        self
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            store: self.store.clone(),
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl<S> Service<Request> for RateLimitMiddleware<S>
where
    S: Service<Request, Response = Response<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let store = self.store.clone();
        let policy = self.policy.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !policy.applies_to(req.uri().path()) {
                return inner.call(req).await;
            }

            let key = extract_key(&req, policy.key_strategy);
            let result = store.check_and_consume(&key, &policy).await;

            if !result.allowed {
                let retry_after = result
                    .retry_after
                    .map(|d| d.as_secs().max(1))
                    .unwrap_or(1);

                warn!(
                    event = "rate_limited",
                    client = %key,
                    path = %req.uri().path(),
                    retry_after,
                );

                let mut response = ApiError::RateLimited {
                    message: policy.message.clone(),
                    retry_after,
                }
                .into_response();
                add_rate_limit_headers(response.headers_mut(), &result);
                return Ok(response);
            }

            let mut response = inner.call(req).await?;
            add_rate_limit_headers(response.headers_mut(), &result);
            Ok(response)
        })
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(result.limit));
    headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(result.remaining));
    headers.insert(X_RATELIMIT_RESET.clone(), HeaderValue::from(result.reset_in_secs()));
}

fn peer_ip(req: &Request) -> Option<String> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn extract_key(req: &Request, strategy: KeyStrategy) -> String {
    let forwarded = || {
        req.headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    match strategy {
        KeyStrategy::PeerIp => peer_ip(req),
        KeyStrategy::ForwardedFor => forwarded().or_else(|| peer_ip(req)),
    }
    .unwrap_or_else(|| "unknown".to_string())
}
