//! Query parameter pollution guard.
//!
//! Repeated query keys collapse to their last value unless the key is on the
//! allow-list, in which case every occurrence is kept in order. The result is
//! stored as a [`QueryParams`] extension and the request URI is rewritten so
//! a plain `Query<T>` extractor sees the same collapsed view.

use crate::error::ApiError;
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, Response, Uri},
    response::IntoResponse,
};
use futures::future::BoxFuture;
use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use url::form_urlencoded;

/// One de-duplicated query value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// The value that wins when a single value is needed.
    pub fn last(&self) -> &str {
        match self {
            Self::Single(v) => v,
            Self::Many(values) => values.last().map(String::as_str).unwrap_or_default(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(v) => vec![v.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// De-duplicated query parameters, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    /// Parse a raw query string, keeping every occurrence only for keys in
    /// `whitelist`.
    pub fn from_query<S: AsRef<str>>(query: &str, whitelist: &[S]) -> Self {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match grouped.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value.into_owned()),
                None => grouped.push((key.into_owned(), vec![value.into_owned()])),
            }
        }

        let entries = grouped
            .into_iter()
            .filter_map(|(key, mut values)| {
                let allowed = whitelist.iter().any(|w| w.as_ref() == key);
                let value = if allowed && values.len() > 1 {
                    ParamValue::Many(values)
                } else {
                    ParamValue::Single(values.pop()?)
                };
                Some((key, value))
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replace or append `key`.
    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back into a query string.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            for v in value.values() {
                serializer.append_pair(key, v);
            }
        }
        serializer.finish()
    }

    /// Store as the request's parameters and rewrite its URI to match.
    pub fn install(self, req: &mut Request) -> Result<(), ApiError> {
        *req.uri_mut() = with_query(req.uri(), &self.to_query_string())?;
        req.extensions_mut().insert(self);
        Ok(())
    }
}

/// Copy of `uri` with its query replaced; an empty query drops the `?`.
pub(crate) fn with_query(uri: &Uri, query: &str) -> Result<Uri, ApiError> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("Invalid query string: {e}")))?,
    );
    Uri::from_parts(parts).map_err(|e| ApiError::BadRequest(format!("Invalid request URI: {e}")))
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(params) = parts.extensions.get::<QueryParams>() {
            return Ok(params.clone());
        }
        let no_whitelist: [&str; 0] = [];
        Ok(QueryParams::from_query(
            parts.uri.query().unwrap_or_default(),
            &no_whitelist,
        ))
    }
}

/// Parameter guard layer.
#[derive(Debug, Clone)]
pub struct ParamGuardLayer {
    whitelist: Arc<[String]>,
}

impl ParamGuardLayer {
    pub fn new(whitelist: impl IntoIterator<Item = String>) -> Self {
        Self {
            whitelist: whitelist.into_iter().collect(),
        }
    }
}

impl<S> Layer<S> for ParamGuardLayer {
    type Service = ParamGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ParamGuard {
            inner,
            whitelist: self.whitelist.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamGuard<S> {
    inner: S,
    whitelist: Arc<[String]>,
}

impl<S> Service<Request> for ParamGuard<S>
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
        let params = QueryParams::from_query(req.uri().query().unwrap_or_default(), &self.whitelist[..]);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Err(err) = params.install(&mut req) {
                return Ok(err.into_response());
            }
            inner.call(req).await
        })
    }
}
