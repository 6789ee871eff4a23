//! Outermost error handling stage.
//!
//! Every failure in the pipeline ends up as an [`ApiError`] response carrying
//! an [`ErrorReport`] extension. This layer decides how much of that report the
//! client gets to see: in development the body is re-rendered with the error
//! detail and source chain, in production the terse body is kept as is.

use super::{response::ErrorReport, types::ApiError};
use crate::config::Environment;
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Response},
};
use futures::future::BoxFuture;
use serde_json::json;
use std::{
    any::Any,
    convert::Infallible,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Error boundary layer.
#[derive(Debug, Clone, Copy)]
pub struct ErrorBoundaryLayer {
    environment: Environment,
}

impl ErrorBoundaryLayer {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl<S> Layer<S> for ErrorBoundaryLayer {
    type Service = ErrorBoundary<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorBoundary {
            inner,
            environment: self.environment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorBoundary<S> {
    inner: S,
    environment: Environment,
}

impl<S> Service<Request> for ErrorBoundary<S>
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

    fn call(&mut self, req: Request) -> Self::Future {
        let environment = self.environment;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            Ok(render(response, environment))
        })
    }
}

fn render(response: Response<Body>, environment: Environment) -> Response<Body> {
    if !environment.is_development() {
        return response;
    }

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let body = json!({
        "status": report.status,
        "error": {
            "statusCode": report.status_code,
            "code": report.code,
            "isOperational": report.operational,
            "detail": report.detail,
        },
        "message": report.raw_message,
        "stack": report.stack,
    });

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, Body::from(body.to_string()))
}

/// Panic handler for `CatchPanicLayer::custom`.
///
/// A panicking handler becomes a non-operational internal error, so clients
/// see the same generic 500 body as any other unexpected failure.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    use axum::response::IntoResponse;

    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
