//! Signup, login, logout and password changes.
//!
//! Successful credential checks answer with the token in the body and in the
//! `jwt` session cookie, so both API clients and the rendered views work.

use crate::{
    error::{ApiError, ApiResult, ErrorContext},
    middleware::{
        auth::{hash_password, verify_password, LOGGED_OUT, SESSION_COOKIE},
        Auth,
    },
    models::{PublicUser, Role, User},
    request::{LoginRequest, SignupRequest, UpdatePasswordRequest, ValidJson},
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// Seconds the logout cookie lives.
const LOGOUT_COOKIE_SECS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    status: &'static str,
    token: String,
    data: TokenData,
}

#[derive(Debug, Serialize)]
struct TokenData {
    user: PublicUser,
}

type TokenReply = (StatusCode, CookieJar, Json<TokenResponse>);

fn session_cookie(value: &str, max_age_secs: i64, secure: bool) -> ApiResult<Cookie<'static>> {
    let mut raw = format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; Max-Age={max_age_secs}");
    if secure {
        raw.push_str("; Secure");
    }
    Cookie::parse(raw).context("building session cookie")
}

/// Issue a token for `user` and answer with it.
fn send_token(state: &AppState, user: &User, status: StatusCode) -> ApiResult<TokenReply> {
    let token = state.tokens.issue(user.id)?;
    let auth = &state.config.auth;
    let cookie = session_cookie(
        &token,
        auth.cookie_expires_in_days * 24 * 60 * 60,
        auth.cookie_secure,
    )?;

    let body = TokenResponse {
        status: "success",
        token,
        data: TokenData {
            user: PublicUser::from(user),
        },
    };
    Ok((status, CookieJar::new().add(cookie), Json(body)))
}

pub async fn signup(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<SignupRequest>,
) -> ApiResult<TokenReply> {
    let hash = hash_password(body.password).await?;
    let user = state
        .users
        .create(User::new(body.name, body.email, Role::User, hash))
        .await?;

    info!(user_id = %user.id, "User signed up");
    send_token(&state, &user, StatusCode::CREATED)
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> ApiResult<TokenReply> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(ApiError::BadRequest("Please provide email and password!".into()));
    };

    let user = state
        .users
        .find_one("email", json!(email.trim().to_lowercase()))
        .await?
        .filter(|user| user.active)
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = %user.id, "User logged in");
    send_token(&state, &user, StatusCode::OK)
}

/// Overwrite the session cookie with a short-lived placeholder.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<serde_json::Value>)> {
    let cookie = session_cookie(LOGGED_OUT, LOGOUT_COOKIE_SECS, state.config.auth.cookie_secure)?;
    Ok((jar.add(cookie), Json(json!({ "status": "success" }))))
}

pub async fn update_password(
    State(state): State<AppState>,
    Auth(identity): Auth,
    ValidJson(body): ValidJson<UpdatePasswordRequest>,
) -> ApiResult<TokenReply> {
    let user = state
        .users
        .find_by_id(identity.id)
        .await?
        .ok_or(ApiError::UserNoLongerExists)?;

    if !verify_password(body.password_current, user.password_hash.clone()).await? {
        return Err(ApiError::WrongCurrentPassword);
    }

    let hash = hash_password(body.password).await?;
    // Backdated so the token issued below is not already stale.
    let changed_at = Utc::now() - Duration::seconds(1);
    let user = state
        .users
        .update(
            user.id,
            json!({ "passwordHash": hash, "passwordChangedAt": changed_at }),
        )
        .await?
        .ok_or(ApiError::UserNoLongerExists)?;

    info!(user_id = %user.id, "Password updated");
    send_token(&state, &user, StatusCode::OK)
}
