//! Authentication middleware layer.

use super::{jwt::TokenIssuer, types::Identity};
use crate::{
    error::ApiError,
    models::User,
    repository::Repository,
};
use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "jwt";

/// Cookie value written on logout.
pub const LOGGED_OUT: &str = "loggedout";

/// Authentication layer configuration.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenIssuer>,
    users: Arc<dyn Repository<User>>,
}

impl AuthLayer {
    /// Create new auth layer.
    pub fn new(tokens: Arc<TokenIssuer>, users: Arc<dyn Repository<User>>) -> Self {
        Self { tokens, users }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            tokens: self.tokens.clone(),
            users: self.users.clone(),
        }
    }
}

/// Authentication middleware service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    tokens: Arc<TokenIssuer>,
    users: Arc<dyn Repository<User>>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let tokens = self.tokens.clone();
        let users = self.users.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match authenticate(req.headers(), &tokens, users.as_ref()).await {
                Ok(identity) => {
                    debug!(user_id = %identity.id, role = %identity.role, "Request authenticated");
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

/// Resolve the caller from the request credentials.
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenIssuer,
    users: &dyn Repository<User>,
) -> Result<Identity, ApiError> {
    let token = extract_token(headers).ok_or(ApiError::NotLoggedIn)?;
    let claims = tokens.verify(&token)?;
    let user_id = claims.user_id().ok_or(ApiError::InvalidToken)?;

    let user = users
        .find_by_id(user_id)
        .await?
        .filter(|user| user.active)
        .ok_or(ApiError::UserNoLongerExists)?;

    if user.changed_password_after(claims.iat) {
        return Err(ApiError::PasswordChanged);
    }

    Ok(Identity::from(&user))
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty() && value != LOGGED_OUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Role,
        repository::InMemoryRepository,
    };
    use axum::{http::StatusCode, routing::get, Extension, Router};
    use chrono::Utc;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test_secret_key_32_chars_long!!!";

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let token = extract_token(&headers(header::AUTHORIZATION, "Bearer test_token"));
        assert_eq!(token.as_deref(), Some("test_token"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let token = extract_token(&headers(header::COOKIE, "jwt=test_token; other=value"));
        assert_eq!(token.as_deref(), Some("test_token"));
    }

    #[test]
    fn test_logged_out_cookie_counts_as_missing() {
        assert!(extract_token(&headers(header::COOKIE, "jwt=loggedout")).is_none());
        assert!(extract_token(&HeaderMap::new()).is_none());
    }

    struct Fixture {
        tokens: Arc<TokenIssuer>,
        users: Arc<InMemoryRepository<User>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tokens: Arc::new(TokenIssuer::new(SECRET, Duration::from_secs(3600))),
                users: Arc::new(InMemoryRepository::new()),
            }
        }

        fn app(&self) -> Router {
            Router::new()
                .route(
                    "/",
                    get(|Extension(identity): Extension<Identity>| async move { identity.email }),
                )
                .route_layer(AuthLayer::new(self.tokens.clone(), self.users.clone()))
        }

        async fn call(&self, token: Option<&str>) -> (StatusCode, String) {
            let mut builder = Request::builder().uri("/");
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let response = self
                .app()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let fx = Fixture::new();
        let user = fx
            .users
            .create(User::new("Ann", "ann@example.com", Role::User, "hash".into()))
            .await
            .unwrap();
        let token = fx.tokens.issue(user.id).unwrap();

        let (status, body) = fx.call(Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ann@example.com");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let (status, body) = Fixture::new().call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("You are not logged in!"));
    }

    #[tokio::test]
    async fn test_deleted_or_inactive_user() {
        let fx = Fixture::new();
        let (status, body) = fx.call(Some(&fx.tokens.issue(Uuid::new_v4()).unwrap())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("does no longer exist"));

        let mut user = User::new("Ann", "ann@example.com", Role::User, "hash".into());
        user.active = false;
        let user = fx.users.create(user).await.unwrap();
        let (status, _) = fx.call(Some(&fx.tokens.issue(user.id).unwrap())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_changed_after_issue() {
        let fx = Fixture::new();
        let mut user = User::new("Ann", "ann@example.com", Role::User, "hash".into());
        user.password_changed_at = Some(Utc::now() + chrono::Duration::seconds(30));
        let user = fx.users.create(user).await.unwrap();

        let (status, body) = fx.call(Some(&fx.tokens.issue(user.id).unwrap())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("User recently changed password!"));
    }

    #[tokio::test]
    async fn test_tampered_token() {
        let (status, body) = Fixture::new().call(Some("abc.def.ghi")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid token"));
    }
}
