//! JWT encoding and decoding utilities.

use super::types::Claims;
use crate::error::ApiError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use uuid::Uuid;

/// Signs and verifies session tokens (HS256).
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_in: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
        }
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Issue a token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
        let expires_in = i64::try_from(self.expires_in.as_secs()).unwrap_or(i64::MAX / 2);
        self.encode(&Claims::new(user_id, expires_in))
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.into()))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}
