//! User handlers: self-service under `/me` style routes and admin CRUD.

use crate::{
    error::{ApiError, ApiResult, ErrorContext},
    middleware::{auth::hash_password, Auth, QueryParams},
    models::{PublicUser, User},
    repository::ListQuery,
    request::{
        CleanPath, CreateUserRequest, IdPath, UpdateMeRequest, UpdateUserRequest, ValidJson,
    },
    response::{no_content, ApiResponse, Document},
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

type UserResponse = ApiResponse<Document<PublicUser>>;

pub async fn list_users(
    State(state): State<AppState>,
    params: QueryParams,
) -> ApiResult<ApiResponse<Document<Vec<PublicUser>>>> {
    let users = state.users.find(&ListQuery::from_params(&params)).await?;
    Ok(ApiResponse::list(users.iter().map(PublicUser::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> ApiResult<UserResponse> {
    let account = body.account;
    let hash = hash_password(account.password).await?;
    let user = User::new(account.name, account.email, body.role.unwrap_or_default(), hash);

    let user = state.users.create(user).await?;
    info!(user_id = %user.id, role = %user.role, "User created by admin");
    Ok(ApiResponse::document(PublicUser::from(&user)).created())
}

pub async fn get_user(
    State(state): State<AppState>,
    CleanPath(IdPath { id }): CleanPath<IdPath>,
) -> ApiResult<UserResponse> {
    let user = find_user(&state, id).await?;
    Ok(ApiResponse::document(PublicUser::from(&user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    CleanPath(IdPath { id }): CleanPath<IdPath>,
    ValidJson(mut body): ValidJson<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    body.email = body.email.map(|email| email.to_lowercase());
    let patch = serde_json::to_value(&body).context("serializing user update")?;

    let user = state.users.update(id, patch).await?.not_found("user")?;
    Ok(ApiResponse::document(PublicUser::from(&user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CleanPath(IdPath { id }): CleanPath<IdPath>,
) -> ApiResult<StatusCode> {
    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound { resource: "user" });
    }
    info!(user_id = %id, "User deleted");
    Ok(no_content())
}

/// The caller's own record.
pub async fn get_me(State(state): State<AppState>, Auth(identity): Auth) -> ApiResult<UserResponse> {
    let user = find_user(&state, identity.id).await?;
    Ok(ApiResponse::document(PublicUser::from(&user)))
}

/// Changes `name` and `email` only. Password fields are refused outright.
pub async fn update_me(
    State(state): State<AppState>,
    Auth(identity): Auth,
    ValidJson(body): ValidJson<UpdateMeRequest>,
) -> ApiResult<UserResponse> {
    if body.password.is_some() || body.password_confirm.is_some() {
        return Err(ApiError::BadRequest(
            "This route is not for password updates. Please use /updateMyPassword.".into(),
        ));
    }

    let mut patch = Map::new();
    if let Some(name) = body.name {
        patch.insert("name".into(), Value::String(name));
    }
    if let Some(email) = body.email {
        patch.insert("email".into(), Value::String(email.to_lowercase()));
    }

    let user = state
        .users
        .update(identity.id, Value::Object(patch))
        .await?
        .ok_or(ApiError::UserNoLongerExists)?;
    Ok(ApiResponse::document(PublicUser::from(&user)))
}

/// Soft delete: the record stays but can no longer authenticate.
pub async fn delete_me(State(state): State<AppState>, Auth(identity): Auth) -> ApiResult<StatusCode> {
    state
        .users
        .update(identity.id, json!({ "active": false }))
        .await?
        .ok_or(ApiError::UserNoLongerExists)?;
    info!(user_id = %identity.id, "User deactivated");
    Ok(no_content())
}

async fn find_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    state.users.find_by_id(id).await?.not_found("user")
}
