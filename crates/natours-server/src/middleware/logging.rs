//! Development request logger.

use axum::{body::Body, extract::Request, http::Response};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{info, info_span, Instrument};

/// Request logging layer. Disabled layers pass requests straight through.
#[derive(Clone)]
pub struct LoggingLayer {
    enabled: bool,
    exclude_paths: Arc<[String]>,
}

impl LoggingLayer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            exclude_paths: Arc::from(Vec::new()),
        }
    }

    pub fn exclude(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.exclude_paths = paths.into_iter().collect();
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware {
            inner,
            enabled: self.enabled,
            exclude_paths: self.exclude_paths.clone(),
        }
    }
}

#[derive(Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
    enabled: bool,
    exclude_paths: Arc<[String]>,
}

impl<S> Service<Request> for LoggingMiddleware<S>
where
    S: Service<Request, Response = Response<Body>, Error = std::convert::Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut inner = self.inner.clone();

        let path = req.uri().path().to_string();
        if !self.enabled || self.exclude_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return Box::pin(async move { inner.call(req).await });
        }

        let method = req.method().clone();
        let uri = req.uri().clone();
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_default();
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_default();

        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %path,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                info!(
                    event = "request_started",
                    method = %method,
                    uri = %uri,
                    user_agent = %user_agent,
                );

                let response = inner.call(req).await?;

                info!(
                    event = "request_completed",
                    status = response.status().as_u16(),
                    duration_ms = start.elapsed().as_millis() as u64,
                );

                Ok(response)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_passes_responses_through() {
        for enabled in [true, false] {
            let app = Router::new()
                .route("/", get(|| async { StatusCode::ACCEPTED }))
                .layer(LoggingLayer::new(enabled).exclude(["/health".to_string()]));

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }
    }
}
