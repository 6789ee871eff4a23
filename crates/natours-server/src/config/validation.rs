//! Configuration validation.

use super::types::{ServerConfig, PLACEHOLDER_JWT_SECRET};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JWT secret: must be at least 32 characters")]
    InvalidJwtSecret,

    #[error("Refusing to run in production with the default JWT secret")]
    PlaceholderJwtSecret,

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid rate limit configuration")]
    InvalidRateLimit,

    #[error("Invalid body limit: must be greater than zero")]
    InvalidBodyLimit,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Validate server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.len() < 32 {
        errors.push(ConfigError::InvalidJwtSecret);
    }

    if !config.server.environment.is_development()
        && config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET
    {
        errors.push(ConfigError::PlaceholderJwtSecret);
    }

    if config.server.port == 0 {
        errors.push(ConfigError::InvalidPort(0));
    }

    if config.rate_limit.enabled
        && (config.rate_limit.max_requests == 0 || config.rate_limit.window_secs == 0)
    {
        errors.push(ConfigError::InvalidRateLimit);
    }

    if config.body.limit_bytes == 0 {
        errors.push(ConfigError::InvalidBodyLimit);
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
