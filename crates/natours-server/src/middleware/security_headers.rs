//! Security header policy.
//!
//! Every response, errors included, leaves with a Content-Security-Policy and
//! the usual hardening headers. The stage never rejects a request.

use crate::config::SecurityConfig;
use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{self, HeaderName, InvalidHeaderValue},
        HeaderValue, Response,
    },
};
use futures::future::BoxFuture;
use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

static X_DNS_PREFETCH_CONTROL: HeaderName = HeaderName::from_static("x-dns-prefetch-control");
static X_PERMITTED_CROSS_DOMAIN_POLICIES: HeaderName =
    HeaderName::from_static("x-permitted-cross-domain-policies");
static X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
static X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
static CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
static CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");
static ORIGIN_AGENT_CLUSTER: HeaderName = HeaderName::from_static("origin-agent-cluster");

/// Directives appended after the configured source lists.
const FIXED_DIRECTIVES: [&str; 6] = [
    "base-uri 'self'",
    "form-action 'self'",
    "frame-ancestors 'self'",
    "object-src 'none'",
    "script-src-attr 'none'",
    "upgrade-insecure-requests",
];

/// Render the Content-Security-Policy value.
pub fn content_security_policy(config: &SecurityConfig) -> String {
    let sourced = [
        ("default-src", &config.default_src),
        ("connect-src", &config.connect_src),
        ("script-src", &config.script_src),
        ("style-src", &config.style_src),
        ("style-src-elem", &config.style_src_elem),
        ("font-src", &config.font_src),
        ("img-src", &config.img_src),
    ];

    sourced
        .iter()
        .filter(|(_, sources)| !sources.is_empty())
        .map(|(name, sources)| format!("{name} {}", sources.join(" ")))
        .chain(FIXED_DIRECTIVES.iter().map(|d| d.to_string()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Precomputed header set.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, InvalidHeaderValue> {
        let csp = HeaderValue::from_str(&content_security_policy(config))?;
        let hsts = HeaderValue::from_str(&format!(
            "max-age={}; includeSubDomains",
            config.hsts_max_age_secs
        ))?;

        let headers = vec![
            (header::CONTENT_SECURITY_POLICY, csp),
            (header::STRICT_TRANSPORT_SECURITY, hsts),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
            (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
            (X_DNS_PREFETCH_CONTROL.clone(), HeaderValue::from_static("off")),
            (X_PERMITTED_CROSS_DOMAIN_POLICIES.clone(), HeaderValue::from_static("none")),
            (X_XSS_PROTECTION.clone(), HeaderValue::from_static("0")),
            (CROSS_ORIGIN_OPENER_POLICY.clone(), HeaderValue::from_static("same-origin")),
            (CROSS_ORIGIN_RESOURCE_POLICY.clone(), HeaderValue::from_static("same-origin")),
            (ORIGIN_AGENT_CLUSTER.clone(), HeaderValue::from_static("?1")),
        ];

        Ok(Self { headers })
    }

    fn apply(&self, response: &mut Response<Body>) {
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers.remove(&X_POWERED_BY);
    }
}

/// Security header layer.
#[derive(Debug, Clone)]
pub struct SecurityHeadersLayer {
    policy: Arc<SecurityHeaders>,
}

impl SecurityHeadersLayer {
    pub fn new(policy: SecurityHeaders) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    policy: Arc<SecurityHeaders>,
}

impl<S> Service<Request> for SecurityHeadersMiddleware<S>
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
        let policy = self.policy.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            policy.apply(&mut response);
            Ok(response)
        })
    }
}
