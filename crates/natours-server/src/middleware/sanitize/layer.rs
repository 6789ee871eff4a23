//! Body sanitizer middleware.

use super::clean::{clean_query, clean_value, form_to_json};
use crate::{error::ApiError, middleware::params::with_query};
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Response},
    response::IntoResponse,
};
use bytes::{Bytes, BytesMut};
use futures::{future::BoxFuture, StreamExt};
use std::{
    convert::Infallible,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::debug;

/// Body representations the sanitizer parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            Self::Json
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            Self::Form
        } else {
            Self::Other
        }
    }
}

/// Sanitizer layer.
#[derive(Debug, Clone, Copy)]
pub struct SanitizeLayer {
    limit: usize,
}

impl SanitizeLayer {
    /// `limit` caps JSON and form bodies in bytes.
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl<S> Layer<S> for SanitizeLayer {
    type Service = SanitizeMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SanitizeMiddleware {
            inner,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SanitizeMiddleware<S> {
    inner: S,
    limit: usize,
}

impl<S> Service<Request> for SanitizeMiddleware<S>
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
        let limit = self.limit;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match sanitize_request(req, limit).await {
                Ok(req) => inner.call(req).await,
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

async fn sanitize_request(req: Request, limit: usize) -> Result<Request, ApiError> {
    let (mut parts, body) = req.into_parts();

    if let Some(query) = parts.uri.query() {
        let cleaned = clean_query(query);
        if cleaned != query {
            debug!(path = %parts.uri.path(), "Sanitized query string");
            parts.uri = with_query(&parts.uri, &cleaned)?;
        }
    }

    let kind = BodyKind::from_headers(&parts.headers);
    if kind == BodyKind::Other {
        return Ok(Request::from_parts(parts, body));
    }

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let bytes = read_limited(body, limit).await?;
    if bytes.is_empty() {
        return Ok(Request::from_parts(parts, Body::empty()));
    }

    let value = match kind {
        BodyKind::Json => serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {e}")))?,
        _ => form_to_json(&bytes),
    };

    let cleaned = serde_json::to_vec(&clean_value(value))
        .map_err(|e| ApiError::Internal(e.into()))?;

    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(cleaned.len()));

    Ok(Request::from_parts(parts, Body::from(cleaned)))
}

/// Read the whole body, failing as soon as it grows past `limit`.
async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    let mut stream = body.into_data_stream();
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::BadRequest(format!("Failed to read request body: {e}")))?;
        if buf.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
