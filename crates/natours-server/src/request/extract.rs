//! Validating extractors.

use crate::{error::ApiError, middleware::sanitize::clean_path_value};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, RawPathParams, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

/// JSON body that passed `validator` checks.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Route parameters, sanitized and then deserialized by name.
///
/// Works like `Path<T>` with a struct target: `#[derive(Deserialize)]
/// struct P { id: Uuid }`. Values are strings before deserialization, so
/// numeric targets should go through `FromStr`-friendly types like `Uuid`.
#[derive(Debug)]
pub struct CleanPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for CleanPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::InvalidId(rejection.body_text()))?;

        let params: Map<String, Value> = raw
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(clean_path_value(value))))
            .collect();

        serde_json::from_value(Value::Object(params))
            .map(CleanPath)
            .map_err(|e| ApiError::InvalidId(e.to_string()))
    }
}
